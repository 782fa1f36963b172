//! Content-addressed cache keys.

use sha2::{Digest, Sha256};

/// SHA-256 of `body`, lowercase hex.
pub fn compute_content_hash(body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    hex::encode(hasher.finalize())
}
