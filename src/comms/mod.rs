pub mod access_token;
pub mod correlation_id;
pub mod guard;
pub mod local_api;
pub mod todo;
