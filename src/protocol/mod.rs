pub mod body;
pub mod headers;
pub mod response;

pub use response::{ApiError, Message, ServiceCode, SubCode, Success};
