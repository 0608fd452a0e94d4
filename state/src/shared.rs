//! Shard manager for concurrent callers
//!
//! Each shard sits behind its own lock. Keys never cross shards, so a write
//! only locks the owning shard; the global root reads one shard root at a time.

use parking_lot::RwLock;
use shardstate_core::{
    Hash, ShardId, ShardStateError, ShardStateResult, StateMutator, StateProvider,
};
use shardstate_crypto::hashing::{bucket_for, sorted_hex_root};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::manager::{rebalance_shards, RebalanceReport, ShardManager};
use crate::proof::{CompressedProof, MerkleProof};
use crate::shard::Shard;
use crate::snapshot::RootSnapshot;

/// Shard manager with one read/write lock per shard
pub struct SharedShardManager {
    shards: Vec<RwLock<Shard>>,
    tick: AtomicU64,
}

impl SharedShardManager {
    pub fn new(shard_count: usize) -> ShardStateResult<Self> {
        Ok(Self::from(ShardManager::new(shard_count)?))
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub fn tick(&self) -> u64 {
        self.tick.load(Ordering::Relaxed)
    }

    pub fn set_tick(&self, tick: u64) {
        self.tick.store(tick, Ordering::Relaxed);
    }

    pub fn partition(&self, key: &str) -> usize {
        bucket_for(key.as_bytes(), self.shards.len())
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.shards[self.partition(key)].write().insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.shards[self.partition(key)]
            .read()
            .get(key)
            .map(str::to_string)
    }

    pub fn require(&self, key: &str) -> ShardStateResult<String> {
        self.get(key)
            .ok_or_else(|| ShardStateError::KeyNotFound(key.to_string()))
    }

    pub fn shard_root(&self, id: ShardId) -> ShardStateResult<Hash> {
        self.shards
            .get(id.index())
            .map(|shard| shard.read().root_hash())
            .ok_or(ShardStateError::ShardNotFound(id.index()))
    }

    /// Global root from a per-shard snapshot of root digests
    pub fn global_root_hash(&self) -> Hash {
        let roots: Vec<Hash> = self.shards.iter().map(|shard| shard.read().root_hash()).collect();
        sorted_hex_root(&roots)
    }

    pub fn snapshot(&self) -> RootSnapshot {
        RootSnapshot::capture(
            self.tick(),
            self.shards.iter().map(|shard| {
                let shard = shard.read();
                (shard.id(), shard.root_hash())
            }),
        )
    }

    /// Rebalance pass; holds every shard's write lock for its duration.
    ///
    /// Locks are always taken in shard order.
    pub fn rebalance(&self) -> RebalanceReport {
        let mut guards: Vec<_> = self.shards.iter().map(|shard| shard.write()).collect();
        let mut shards: Vec<&mut Shard> = guards.iter_mut().map(|guard| &mut **guard).collect();
        rebalance_shards(&mut shards)
    }

    pub fn generate_proof(&self, key: &str) -> Option<MerkleProof> {
        self.shards[self.partition(key)].read().generate_proof(key)
    }

    pub fn generate_compressed_proof(&self, key: &str) -> Option<CompressedProof> {
        self.shards[self.partition(key)]
            .read()
            .generate_compressed_proof(key)
    }

    /// Unwrap back into a single-threaded manager
    pub fn into_inner(self) -> ShardManager {
        let tick = self.tick.into_inner();
        let shards = self.shards.into_iter().map(RwLock::into_inner).collect();
        ShardManager::from_shards(shards, tick)
    }
}

impl From<ShardManager> for SharedShardManager {
    fn from(manager: ShardManager) -> Self {
        let tick = manager.tick();
        Self {
            shards: manager.into_shards().into_iter().map(RwLock::new).collect(),
            tick: AtomicU64::new(tick),
        }
    }
}

/// Thread-safe shard manager handle
pub type SharedStore = Arc<SharedShardManager>;

/// Create a shared shard manager
pub fn create_shared_store(shard_count: usize) -> ShardStateResult<SharedStore> {
    Ok(Arc::new(SharedShardManager::new(shard_count)?))
}
