//! Wire primitives: policy encoding and HMAC signing (panic-free).
//!
//! Encoding rules:
//! - Standard base64 alphabet with padding, then `+` -> `-` and `/` -> `_`.
//! - Padding (`=`) is kept. The storage API expects it, so this is NOT
//!   `URL_SAFE_NO_PAD` and must not be "fixed".
//!
//! Signing is HMAC-SHA256 over the encoded string, hex digest in lowercase.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{PolicyError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Encode canonical policy bytes into the storage API's base64 variant.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD
        .encode(bytes)
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect()
}

/// HMAC-SHA256 of `encoded` keyed with `secret`, as 64 lowercase hex chars.
pub fn sign(encoded: &str, secret: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PolicyError::Encoding(format!("hmac key rejected: {e}")))?;
    mac.update(encoded.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}
