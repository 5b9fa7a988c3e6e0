// src/utils/hashing.rs
use sha2::{Digest, Sha256};

/// Hex SHA-256 of an identity key. Used as the durable cache document id so
/// that arbitrary (Hangul, spaces, slashes) keys map to safe ids.
pub fn identity_digest(identity_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(identity_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Stable 64-bit seed for one (identity, purpose) pair.
pub fn seed_for(identity_key: &str, salt: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(identity_key.as_bytes());
    hasher.update(b"|");
    hasher.update(salt.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}
