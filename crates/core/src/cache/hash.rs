//! Cache key generation.

use sha2::{Digest, Sha256};

/// Compute the storage key for a request URL.
///
/// Callers pass the URL with its fragment already removed; the query string
/// is part of the key.
pub fn compute_cache_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
