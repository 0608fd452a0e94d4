//! Root snapshots: every shard root plus the global root at one tick

use serde::{Deserialize, Serialize};
use shardstate_core::{Hash, ShardId, ShardStateResult};
use shardstate_crypto::hashing::sorted_hex_root;
use std::collections::VecDeque;

/// Root of one shard at snapshot time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardRoot {
    pub shard: ShardId,
    pub root: Hash,
}

/// Every shard root at one tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootSnapshot {
    /// Tick at time of snapshot
    pub tick: u64,
    /// Shard roots in shard order
    pub shard_roots: Vec<ShardRoot>,
    /// Global root over `shard_roots`
    pub global_root: Hash,
    /// Seconds since the Unix epoch
    pub taken_at: u64,
}

impl RootSnapshot {
    /// Capture a snapshot from shard roots
    pub fn capture<I>(tick: u64, roots: I) -> Self
    where
        I: IntoIterator<Item = (ShardId, Hash)>,
    {
        let shard_roots: Vec<ShardRoot> = roots
            .into_iter()
            .map(|(shard, root)| ShardRoot { shard, root })
            .collect();
        let hashes: Vec<Hash> = shard_roots.iter().map(|entry| entry.root).collect();

        Self {
            tick,
            global_root: sorted_hex_root(&hashes),
            shard_roots,
            taken_at: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        }
    }

    /// Recompute the global root from the shard roots
    pub fn verify(&self) -> bool {
        let hashes: Vec<Hash> = self.shard_roots.iter().map(|entry| entry.root).collect();
        sorted_hex_root(&hashes) == self.global_root
    }

    pub fn root_of(&self, shard: ShardId) -> Option<Hash> {
        self.shard_roots
            .iter()
            .find(|entry| entry.shard == shard)
            .map(|entry| entry.root)
    }

    /// Shards whose root differs from `earlier`
    pub fn changed_since(&self, earlier: &RootSnapshot) -> Vec<ShardId> {
        self.shard_roots
            .iter()
            .filter(|entry| earlier.root_of(entry.shard) != Some(entry.root))
            .map(|entry| entry.shard)
            .collect()
    }

    pub fn to_bytes(&self) -> ShardStateResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> ShardStateResult<Self> {
        Ok(bincode::deserialize(bytes)?)
    }

    pub fn to_json(&self) -> ShardStateResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Most recent snapshots, oldest first, capped at `capacity`
pub struct SnapshotHistory {
    snapshots: VecDeque<RootSnapshot>,
    capacity: usize,
}

impl SnapshotHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            snapshots: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record `snapshot`, evicting the oldest one once full
    pub fn add(&mut self, snapshot: RootSnapshot) {
        if self.snapshots.len() == self.capacity {
            self.snapshots.pop_front();
        }
        if self.capacity > 0 {
            self.snapshots.push_back(snapshot);
        }
    }

    pub fn latest(&self) -> Option<&RootSnapshot> {
        self.snapshots.back()
    }
}

impl Default for SnapshotHistory {
    fn default() -> Self {
        Self::new(10)
    }
}
