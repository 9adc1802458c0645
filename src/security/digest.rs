//! Canonicalization and digest helpers shared by both signature paths.
//!
//! Signer and verifier must feed byte-identical input into their hashes, so
//! JSON compaction here only ever drops insignificant whitespace. Keys keep
//! their received order and numbers keep their received spelling.

use base64::{engine::general_purpose, Engine};
use serde::de::IgnoredAny;
use sha2::{Digest, Sha256};

/// Remove insignificant whitespace from a JSON document.
///
/// The input is fully parsed first so malformed JSON is an error rather than
/// something that silently passes through.
pub fn compact_json(body: &[u8]) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::from_slice::<IgnoredAny>(body)?;

    let mut out = Vec::with_capacity(body.len());
    let mut in_string = false;
    let mut escaped = false;
    for &b in body {
        if in_string {
            out.push(b);
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b' ' | b'\t' | b'\n' | b'\r' => {}
            b'"' => {
                in_string = true;
                out.push(b);
            }
            _ => out.push(b),
        }
    }
    Ok(out)
}

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Digest of a request body as it appears in the canonical signing string.
///
/// An empty (or whitespace-only) body digests as zero bytes, which is what a
/// bodiless GET signs over. Anything else must be valid JSON.
pub fn body_digest(body: &[u8]) -> Result<String, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(sha256_hex(&[]));
    }
    let compact = compact_json(body)?;
    Ok(sha256_hex(&compact))
}

pub fn encode_base64(data: &[u8]) -> String {
    general_purpose::STANDARD.encode(data)
}

pub fn decode_base64(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::STANDARD.decode(data)
}
