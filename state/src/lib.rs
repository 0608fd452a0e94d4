//! SHARDSTATE State Management
//! 
//! Provides the sharded, hash-committed key-value store: per-shard
//! authenticated tries, inclusion proofs, and the global root over all shards.
//! Keys are dot-delimited paths such as `account.alice.balance`.

pub mod trie;
pub mod proof;
pub mod shard;
pub mod manager;
pub mod shared;
pub mod snapshot;

pub use trie::*;
pub use proof::*;
pub use shard::*;
pub use manager::*;
pub use shared::*;
pub use snapshot::*;
