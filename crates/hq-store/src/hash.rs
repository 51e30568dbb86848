//! Content digests for generated artifacts.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of the artifact bytes.
pub fn artifact_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    format!("{:x}", result)
}
