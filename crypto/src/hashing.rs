//! Hashing functions using SHA-256

use shardstate_core::Hash;
use sha2::{Digest, Sha256};

/// Compute SHA-256 hash of data
pub fn sha256_hash(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&result);
    Hash::from_bytes(bytes)
}

/// Default hash function (SHA-256)
pub fn hash(data: &[u8]) -> Hash {
    sha256_hash(data)
}

/// Hash of the concatenated lowercase hex renderings, after sorting them.
///
/// The result does not depend on the order of `hashes`.
pub fn sorted_hex_root(hashes: &[Hash]) -> Hash {
    let mut rendered: Vec<String> = hashes.iter().map(|h| h.to_hex()).collect();
    rendered.sort();
    hash(rendered.concat().as_bytes())
}

/// Bucket a key into one of `buckets` slots using the first digest byte.
///
/// `buckets` must be non-zero.
pub fn bucket_for(key: &[u8], buckets: usize) -> usize {
    hash(key).as_bytes()[0] as usize % buckets
}

/// Incremental hasher for large data
pub struct IncrementalHasher {
    hasher: Sha256,
}

impl IncrementalHasher {
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    pub fn finalize(self) -> Hash {
        let result = self.hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&result);
        Hash::from_bytes(bytes)
    }
}

impl Default for IncrementalHasher {
    fn default() -> Self {
        Self::new()
    }
}
