//! Hashing helpers.
//!
//! - `ContentHash`: a full 64-character SHA-256 digest
//! - `hash_bytes()`: digest of arbitrary bytes
//! - `short_id()`: a deterministic, readable identifier derived from a key

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Length of identifiers produced by [`short_id`].
pub const SHORT_ID_LEN: usize = 16;

/// A full 64-character SHA-256 hash, lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Hash arbitrary bytes.
pub fn hash_bytes(data: &[u8]) -> ContentHash {
  let mut hasher = Sha256::new();
  hasher.update(data);
  ContentHash(hex::encode(hasher.finalize()))
}

/// Derive a stable identifier from `kind` and `key`.
///
/// The same inputs always give the same id, so repeated dry runs print
/// identical output. `kind` keeps ids for different resources apart.
pub fn short_id(kind: &str, key: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(kind.as_bytes());
  hasher.update([0u8]);
  hasher.update(key.as_bytes());
  hex::encode(hasher.finalize())[..SHORT_ID_LEN].to_string()
}
