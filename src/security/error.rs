use thiserror::Error;

/// Failures raised by the trust protocol itself.
///
/// Variants are intentionally coarse. Callers map them onto user-facing
/// response codes and must not leak the inner detail to clients.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("unknown client key")]
    UnknownClient,

    #[error("client signature rejected: {reason}")]
    ClientSignature { reason: &'static str },

    #[error("invalid access token")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),

    #[error("request signature mismatch")]
    InvalidSignature,

    #[error("request body is not valid JSON: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("key material: {0}")]
    KeyMaterial(String),

    #[error("token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("token lifetime out of range")]
    ExpiryOutOfRange,
}

impl AuthError {
    pub fn client_signature(reason: &'static str) -> Self {
        Self::ClientSignature { reason }
    }

    pub fn key_material(message: impl Into<String>) -> Self {
        Self::KeyMaterial(message.into())
    }
}
