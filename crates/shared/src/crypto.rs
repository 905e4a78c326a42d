//! Cryptographic utilities for request signing and random identifiers.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use rand::{distributions::Alphanumeric, Rng};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Computes HMAC-SHA256 of `message` with a base64-encoded key and returns
/// the signature base64-encoded.
///
/// Returns `None` if the key is not valid base64.
pub fn hmac_sha256_base64(key_b64: &str, message: &str) -> Option<String> {
    let key = STANDARD.decode(key_b64).ok()?;
    let mut mac = HmacSha256::new_from_slice(&key).ok()?;
    mac.update(message.as_bytes());
    Some(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Generates a random lowercase alphanumeric string of the given length.
pub fn random_lowercase_alphanumeric(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect()
}

/// Encodes raw bytes as standard base64.
pub fn base64_encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
