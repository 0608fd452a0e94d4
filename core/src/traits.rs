//! Core traits defining SHARDSTATE interfaces
//!
//! These traits define the contracts shared by shards and shard managers.

use crate::error::{ShardStateError, ShardStateResult};
use crate::types::*;

/// Trait for types that commit to their content with a digest
pub trait Hashable {
    /// Current digest of this object
    fn hash(&self) -> Hash;
}

/// Read access to committed state
pub trait StateProvider {
    /// Root commitment over everything this provider holds
    fn root(&self) -> StateRoot;

    /// Get a value by dotted key
    fn get(&self, key: &str) -> Option<&str>;

    /// Check if a key resolves
    fn exists(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Like `get`, but a missing key is an error
    fn require(&self, key: &str) -> ShardStateResult<&str> {
        self.get(key)
            .ok_or_else(|| ShardStateError::KeyNotFound(key.to_string()))
    }
}

/// Write access to state
pub trait StateMutator: StateProvider {
    /// Insert or overwrite a value, creating intermediate path segments
    fn insert(&mut self, key: &str, value: &str);

    /// Apply several writes in order
    fn apply_batch<'a, I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
        Self: Sized,
    {
        for (key, value) in entries {
            self.insert(key, value);
        }
    }
}
