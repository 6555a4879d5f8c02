//! Content hashing used for dataset identity and cache keys.

use sha2::{Digest, Sha256};

/// SHA-256 of `input`, hex encoded.
pub fn sha256_hex(input: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    hex::encode(hasher.finalize())
}

/// SHA-256 over several parts. Each part is length-prefixed so that
/// `["ab", "c"]` and `["a", "bc"]` hash differently.
pub fn sha256_hex_parts(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    hex::encode(hasher.finalize())
}
