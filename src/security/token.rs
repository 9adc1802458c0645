//! Client-credential exchange and bearer token validation.
//!
//! Issuance: the client proves possession of its RSA key by signing
//! `clientKey|timestamp` (PKCS#1 v1.5, SHA-256). On success the server mints an
//! RS256 JWT carrying `iat`, `iss` and `exp`. Nothing is stored server-side.
//!
//! Verification accepts a token only when it is RSA-signed by the server key,
//! names the configured issuer and has not expired. Every failure is reported
//! as the same [`AuthError::InvalidToken`].

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{Algorithm, Header, Validation};
use rsa::Pkcs1v15Sign;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::security::digest::decode_base64;
use crate::security::error::AuthError;
use crate::security::keys::{ClientIdentity, ServerKeyPair};

pub const GRANT_TYPE: &str = "client_credentials";
pub const TOKEN_TYPE: &str = "Bearer";

/// Algorithms of the RSA PKCS#1 family; anything else is refused outright.
const RSA_FAMILY: [Algorithm; 3] = [Algorithm::RS256, Algorithm::RS384, Algorithm::RS512];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub iat: i64,
    pub iss: String,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub claims: AccessClaims,
}

/// The exact string the client signs when asking for a token.
pub fn token_string_to_sign(client_key: &str, timestamp: &str) -> String {
    format!("{client_key}|{timestamp}")
}

#[derive(Debug, Clone)]
pub struct TokenIssuer {
    issuer: String,
    expire_secs: u64,
    client: Arc<ClientIdentity>,
    server: Arc<ServerKeyPair>,
}

impl TokenIssuer {
    pub fn new(
        issuer: impl Into<String>,
        expire_secs: u64,
        client: Arc<ClientIdentity>,
        server: Arc<ServerKeyPair>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            expire_secs,
            client,
            server,
        }
    }

    pub fn expire_secs(&self) -> u64 {
        self.expire_secs
    }

    /// Check the client key, then the RSA signature over `clientKey|timestamp`.
    ///
    /// The key comparison happens first so unknown clients never reach the
    /// signature code path.
    pub fn authenticate_client(
        &self,
        client_key: &str,
        timestamp: &str,
        signature_b64: &str,
    ) -> Result<(), AuthError> {
        if !self.client.matches_key(client_key) {
            return Err(AuthError::UnknownClient);
        }

        let signature =
            decode_base64(signature_b64).map_err(|_| AuthError::client_signature("decode"))?;
        let hashed = Sha256::digest(token_string_to_sign(client_key, timestamp).as_bytes());
        self.client
            .public_key()
            .verify(Pkcs1v15Sign::new::<Sha256>(), &hashed, &signature)
            .map_err(|_| AuthError::client_signature("verify"))
    }

    pub fn mint(&self) -> Result<IssuedToken, AuthError> {
        self.mint_at(Utc::now().timestamp())
    }

    /// Mint a token as if the current time were `issued_at` (unix seconds).
    pub fn mint_at(&self, issued_at: i64) -> Result<IssuedToken, AuthError> {
        let exp = i64::try_from(self.expire_secs)
            .ok()
            .and_then(|secs| issued_at.checked_add(secs))
            .ok_or(AuthError::ExpiryOutOfRange)?;
        let claims = AccessClaims {
            iat: issued_at,
            iss: self.issuer.clone(),
            exp,
        };
        let access_token = jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &claims,
            self.server.encoding_key(),
        )
        .map_err(AuthError::Signing)?;
        Ok(IssuedToken {
            access_token,
            claims,
        })
    }
}

#[derive(Debug, Clone)]
pub struct TokenVerifier {
    server: Arc<ServerKeyPair>,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(issuer: &str, server: Arc<ServerKeyPair>) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.algorithms = RSA_FAMILY.to_vec();
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        Self { server, validation }
    }

    pub fn verify(&self, token: &str) -> Result<AccessClaims, AuthError> {
        jsonwebtoken::decode::<AccessClaims>(token, self.server.decoding_key(), &self.validation)
            .map(|data| data.claims)
            .map_err(AuthError::InvalidToken)
    }
}
