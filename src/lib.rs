pub mod comms;
pub mod config;
pub mod protocol;
pub mod security;
pub mod todos;
pub mod utils;

// Crate version exposed for runtime queries
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
