//! Static trust material: the single client identity and the server's token
//! signing key pair. Loaded once at startup and shared read-only afterwards.

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use jsonwebtoken::{DecodingKey, EncodingKey};
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::RsaPublicKey;
use subtle::ConstantTimeEq;

use crate::config::Config;
use crate::security::error::AuthError;

/// The one client this deployment trusts.
pub struct ClientIdentity {
    client_key: String,
    public_key: RsaPublicKey,
    shared_secret: Vec<u8>,
}

impl ClientIdentity {
    pub fn new(
        client_key: impl Into<String>,
        public_key_pem: &str,
        shared_secret: impl Into<Vec<u8>>,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            client_key: client_key.into(),
            public_key: parse_rsa_public_key(public_key_pem)?,
            shared_secret: shared_secret.into(),
        })
    }

    pub fn client_key(&self) -> &str {
        &self.client_key
    }

    /// Constant-time comparison against the configured client key.
    pub fn matches_key(&self, candidate: &str) -> bool {
        candidate.as_bytes().ct_eq(self.client_key.as_bytes()).into()
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    pub fn shared_secret(&self) -> &[u8] {
        &self.shared_secret
    }
}

impl std::fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("client_key", &self.client_key)
            .field("shared_secret", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// RSA pair used only to sign and verify access tokens.
pub struct ServerKeyPair {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl ServerKeyPair {
    pub fn from_pem(private_pem: &str, public_pem: &str) -> Result<Self, AuthError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes())
            .map_err(|e| AuthError::key_material(format!("server private key: {e}")))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| AuthError::key_material(format!("server public key: {e}")))?;
        Ok(Self {
            encoding_key,
            decoding_key,
        })
    }

    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

impl std::fmt::Debug for ServerKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerKeyPair").finish_non_exhaustive()
    }
}

/// All key material of a deployment.
#[derive(Debug, Clone)]
pub struct KeyStore {
    pub client: Arc<ClientIdentity>,
    pub server: Arc<ServerKeyPair>,
}

impl KeyStore {
    pub fn new(client: ClientIdentity, server: ServerKeyPair) -> Self {
        Self {
            client: Arc::new(client),
            server: Arc::new(server),
        }
    }

    /// Read every PEM file named by the configuration and parse it.
    pub fn load(config: &Config) -> Result<Self> {
        let server_private = fs::read_to_string(&config.server.private_key)
            .with_context(|| format!("reading server private key {}", config.server.private_key))?;
        let server_public = fs::read_to_string(&config.server.public_key)
            .with_context(|| format!("reading server public key {}", config.server.public_key))?;
        let client_public = fs::read_to_string(&config.client.public_key)
            .with_context(|| format!("reading client public key {}", config.client.public_key))?;

        let server = ServerKeyPair::from_pem(&server_private, &server_public)?;
        let client = ClientIdentity::new(
            config.client.key.clone(),
            &client_public,
            config.client.secret.as_bytes().to_vec(),
        )?;
        Ok(Self::new(client, server))
    }
}

/// Accepts SubjectPublicKeyInfo (`PUBLIC KEY`) and falls back to PKCS#1
/// (`RSA PUBLIC KEY`).
fn parse_rsa_public_key(pem: &str) -> Result<RsaPublicKey, AuthError> {
    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|e| AuthError::key_material(format!("client public key: {e}")))
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub const SERVER_PRIVATE: &str = include_str!("../../tests/fixtures/server_private.pem");
    pub const SERVER_PUBLIC: &str = include_str!("../../tests/fixtures/server_public.pem");
    pub const CLIENT_PRIVATE: &str = include_str!("../../tests/fixtures/client_private.pem");
    pub const CLIENT_PUBLIC: &str = include_str!("../../tests/fixtures/client_public.pem");
    pub const ROGUE_PRIVATE: &str = include_str!("../../tests/fixtures/rogue_private.pem");
    pub const ROGUE_PUBLIC: &str = include_str!("../../tests/fixtures/rogue_public.pem");

    use super::{ClientIdentity, KeyStore, ServerKeyPair};

    pub fn key_store(client_key: &str, secret: &str) -> KeyStore {
        KeyStore::new(
            ClientIdentity::new(client_key, CLIENT_PUBLIC, secret.as_bytes().to_vec()).unwrap(),
            ServerKeyPair::from_pem(SERVER_PRIVATE, SERVER_PUBLIC).unwrap(),
        )
    }
}
