pub mod audit_log;
pub mod digest;
pub mod error;
pub mod keys;
pub mod request_signer;
pub mod token;

pub use error::AuthError;
pub use keys::{ClientIdentity, KeyStore, ServerKeyPair};
pub use request_signer::SignedRequest;
pub use token::{TokenIssuer, TokenVerifier};
