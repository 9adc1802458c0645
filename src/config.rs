use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::time::Duration;

use crate::protocol::headers::MAX_CLIENT_KEY_LEN;

pub const DEFAULT_APP_MODE: &str = "development";
/// Ten years.
pub const MAX_TOKEN_EXPIRE: u64 = 315_360_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Token lifetime in seconds.
    pub expire: u64,
    pub issuer: String,
}

/// PEM file paths of the server's RS256 key pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerKeys {
    pub public_key: String,
    pub private_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub key: String,
    pub secret: String,
    /// PEM file path of the client's RSA public key.
    pub public_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub port: u16,
    /// Per-request timeout in seconds.
    pub server_timeout: u64,
    #[serde(default = "default_app_mode")]
    pub app_mode: String,
    pub token: TokenConfig,
    pub server: ServerKeys,
    pub client: ClientConfig,
}

fn default_app_mode() -> String {
    DEFAULT_APP_MODE.to_string()
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let raw = fs::read_to_string(path).with_context(|| format!("reading config file {path}"))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let mut cfg: Value = serde_json::from_str(raw).context("parsing JSON")?;
        expand_values(&mut cfg, &|name: &str| std::env::var(name).ok());
        let typed: Config = serde_json::from_value(cfg).context("mapping to Config")?;
        typed.validate()?;
        Ok(typed)
    }

    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            bail!("config: port must be non-zero");
        }
        if self.server_timeout == 0 {
            bail!("config: server_timeout must be greater than zero");
        }
        if self.token.expire == 0 {
            bail!("config: token.expire must be greater than zero");
        }
        if self.token.expire > MAX_TOKEN_EXPIRE {
            bail!("config: token.expire must be at most {MAX_TOKEN_EXPIRE} seconds");
        }
        for (name, value) in [
            ("token.issuer", &self.token.issuer),
            ("server.public_key", &self.server.public_key),
            ("server.private_key", &self.server.private_key),
            ("client.key", &self.client.key),
            ("client.secret", &self.client.secret),
            ("client.public_key", &self.client.public_key),
        ] {
            if value.is_empty() {
                bail!("config: {name} must not be empty");
            }
        }
        if self.client.key.chars().count() > MAX_CLIENT_KEY_LEN {
            bail!("config: client.key must be at most {MAX_CLIENT_KEY_LEN} characters");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.server_timeout)
    }

    pub fn is_production(&self) -> bool {
        self.app_mode.eq_ignore_ascii_case("production")
    }
}

/// Expand `$VAR` / `${VAR}` in every string of `value`, recursively.
fn expand_values(value: &mut Value, lookup: &dyn Fn(&str) -> Option<String>) {
    match value {
        Value::String(s) => *s = expand_env(s, lookup),
        Value::Array(items) => items.iter_mut().for_each(|v| expand_values(v, lookup)),
        Value::Object(map) => map.values_mut().for_each(|v| expand_values(v, lookup)),
        _ => {}
    }
}

/// Unset variables expand to the empty string. A `$` not followed by a
/// name is kept as is.
pub fn expand_env(input: &str, lookup: &dyn Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        if let Some(braced) = after.strip_prefix('{') {
            if let Some(end) = braced.find('}') {
                out.push_str(&lookup(&braced[..end]).unwrap_or_default());
                rest = &braced[end + 1..];
                continue;
            }
            out.push('$');
            rest = after;
            continue;
        }
        let len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        if len == 0 {
            out.push('$');
        } else {
            out.push_str(&lookup(&after[..len]).unwrap_or_default());
        }
        rest = &after[len..];
    }
    out.push_str(rest);
    out
}
