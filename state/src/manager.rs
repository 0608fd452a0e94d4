//! Shard routing, global commitment, and the rebalance pass

use serde::{Deserialize, Serialize};
use shardstate_core::{
    Hash, ShardId, ShardStateError, ShardStateResult, StateMutator, StateProvider, StateRoot,
    StoreConfig,
};
use shardstate_crypto::hashing::{bucket_for, sorted_hex_root};
use tracing::{debug, info, warn};

use crate::proof::{CompressedProof, MerkleProof};
use crate::shard::Shard;
use crate::snapshot::RootSnapshot;

/// Mutations above the average a shard may take before it is reported
pub const OVERLOAD_MARGIN: u64 = 2;

/// Outcome of one rebalance pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceReport {
    pub total_mutations: u64,
    /// Floor of total / shard count
    pub average: u64,
    /// Counts strictly above this are overloaded
    pub threshold: u64,
    pub overloaded: Vec<ShardId>,
}

impl RebalanceReport {
    pub fn is_balanced(&self) -> bool {
        self.overloaded.is_empty()
    }
}

/// Run a rebalance pass over `shards` and reset every counter.
///
/// Overloaded shards are only reported; nothing is split or moved.
pub(crate) fn rebalance_shards(shards: &mut [&mut Shard]) -> RebalanceReport {
    let total_mutations: u64 = shards.iter().map(|shard| shard.mutations()).sum();
    let average = match shards.len() {
        0 => 0,
        n => total_mutations / n as u64,
    };
    let threshold = average + OVERLOAD_MARGIN;

    info!(
        shards = shards.len(),
        total_mutations,
        average,
        "Rebalancing shards"
    );

    let mut overloaded = Vec::new();
    for shard in shards.iter_mut() {
        let mutations = shard.reset_mutations();
        if mutations > threshold {
            warn!(
                shard = %shard.id(),
                mutations,
                threshold,
                "Shard overloaded, consider splitting"
            );
            overloaded.push(shard.id());
        }
    }

    RebalanceReport {
        total_mutations,
        average,
        threshold,
        overloaded,
    }
}

/// Owns every shard and routes keys between them
#[derive(Debug, Clone)]
pub struct ShardManager {
    shards: Vec<Shard>,
    /// Caller-supplied epoch, only used to pick which shards are dumped
    tick: u64,
}

impl ShardManager {
    /// Create a manager with a fixed number of empty shards
    pub fn new(shard_count: usize) -> ShardStateResult<Self> {
        if shard_count == 0 {
            return Err(ShardStateError::InvalidShardCount(shard_count));
        }

        let shards = (0..shard_count).map(|i| Shard::new(ShardId::new(i))).collect();
        Ok(Self { shards, tick: 0 })
    }

    /// Reassemble a manager from shards in id order
    pub(crate) fn from_shards(shards: Vec<Shard>, tick: u64) -> Self {
        Self { shards, tick }
    }

    pub fn into_shards(self) -> Vec<Shard> {
        self.shards
    }

    pub fn from_config(config: &StoreConfig) -> ShardStateResult<Self> {
        config.validate()?;
        Self::new(config.shard_count)
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub fn shards(&self) -> &[Shard] {
        &self.shards
    }

    pub fn shard(&self, id: ShardId) -> ShardStateResult<&Shard> {
        self.shards
            .get(id.index())
            .ok_or(ShardStateError::ShardNotFound(id.index()))
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    /// Index of the shard that owns `key`: first digest byte modulo shard count
    pub fn partition(&self, key: &str) -> usize {
        bucket_for(key.as_bytes(), self.shards.len())
    }

    pub fn shard_for_key(&self, key: &str) -> &Shard {
        &self.shards[self.partition(key)]
    }

    fn shard_for_key_mut(&mut self, key: &str) -> &mut Shard {
        let index = self.partition(key);
        &mut self.shards[index]
    }

    /// Commitment over every shard root, independent of shard order
    pub fn global_root_hash(&self) -> Hash {
        let roots: Vec<Hash> = self.shards.iter().map(Shard::root_hash).collect();
        sorted_hex_root(&roots)
    }

    /// Zero every mutation counter without running the rebalance pass
    pub fn reset_mutations(&mut self) {
        for shard in &mut self.shards {
            shard.reset_mutations();
        }
    }

    /// Report overloaded shards and reset all mutation counters
    pub fn rebalance(&mut self) -> RebalanceReport {
        let mut shards: Vec<&mut Shard> = self.shards.iter_mut().collect();
        rebalance_shards(&mut shards)
    }

    pub fn generate_proof(&self, key: &str) -> Option<MerkleProof> {
        self.shard_for_key(key).generate_proof(key)
    }

    /// Sibling digests for `key`, or `None` if its path does not resolve
    pub fn generate_compressed_proof(&self, key: &str) -> Option<CompressedProof> {
        let proof = self.shard_for_key(key).generate_compressed_proof(key);
        if proof.is_none() {
            debug!(key, "Key not found for proof");
        }
        proof
    }

    /// Like `generate_proof`, but a missing key is an error
    pub fn prove(&self, key: &str) -> ShardStateResult<MerkleProof> {
        self.generate_proof(key)
            .ok_or_else(|| ShardStateError::KeyNotFound(key.to_string()))
    }

    /// Verify a full proof against the root of the shard that owns its key
    pub fn verify_proof(&self, proof: &MerkleProof) -> ShardStateResult<()> {
        proof.verify(&self.shard_for_key(&proof.key).root_hash())
    }

    /// Shards shown for the current tick: those whose id parity matches it
    pub fn active_shards(&self) -> impl Iterator<Item = &Shard> {
        let tick = self.tick;
        self.shards.iter().filter(move |shard| shard.id().is_active_at(tick))
    }

    /// Full dump of the active shards
    pub fn render_active_shards(&self) -> String {
        let mut out = format!("=== Tick {} ===\n", self.tick);
        for shard in self.active_shards() {
            out.push_str(&shard.dump());
        }
        out
    }

    pub fn snapshot(&self) -> RootSnapshot {
        RootSnapshot::capture(
            self.tick,
            self.shards.iter().map(|shard| (shard.id(), shard.root_hash())),
        )
    }
}

impl StateProvider for ShardManager {
    fn root(&self) -> StateRoot {
        self.global_root_hash()
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.shard_for_key(key).get(key)
    }
}

impl StateMutator for ShardManager {
    fn insert(&mut self, key: &str, value: &str) {
        self.shard_for_key_mut(key).insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shardstate_core::segment_count;

    /// `count` distinct keys that route to `shard`
    fn keys_for_shard(manager: &ShardManager, shard: usize, count: usize) -> Vec<String> {
        (0..)
            .map(|i| format!("account.user{}.balance", i))
            .filter(|key| manager.partition(key) == shard)
            .take(count)
            .collect()
    }

    fn seeded() -> ShardManager {
        let mut manager = ShardManager::new(4).unwrap();
        manager.insert("account.alice.balance", "100");
        manager.insert("account.bob.balance", "200");
        manager
    }

    #[test]
    fn test_zero_shards_rejected() {
        assert!(matches!(
            ShardManager::new(0),
            Err(ShardStateError::InvalidShardCount(0))
        ));
        let config = StoreConfig { shard_count: 0 };
        assert!(ShardManager::from_config(&config).is_err());
    }

    #[test]
    fn test_end_to_end() {
        let mut manager = seeded();

        assert_eq!(manager.get("account.alice.balance"), Some("100"));
        assert_eq!(manager.get("account.carol.balance"), None);

        let root = manager.global_root_hash();
        assert_eq!(root.to_hex().len(), 64);

        manager.insert("account.alice.balance", "150");
        assert_ne!(manager.global_root_hash(), root);
        assert_eq!(manager.get("account.alice.balance"), Some("150"));
    }

    #[test]
    fn test_partition_stable_and_in_range() {
        let manager = ShardManager::new(4).unwrap();
        for i in 0..100 {
            let key = format!("account.user{}.balance", i);
            let shard = manager.partition(&key);
            assert!(shard < 4);
            assert_eq!(shard, manager.partition(&key));
        }
    }

    #[test]
    fn test_partition_uses_first_digest_byte() {
        let manager = ShardManager::new(4).unwrap();
        let key = "account.alice.balance";
        let expected = shardstate_crypto::hashing::hash(key.as_bytes()).as_bytes()[0] as usize % 4;
        assert_eq!(manager.partition(key), expected);
    }

    #[test]
    fn test_keys_stay_in_owning_shard() {
        let manager = seeded();
        let owner = manager.partition("account.alice.balance");

        for shard in manager.shards() {
            let found = shard.get("account.alice.balance").is_some();
            assert_eq!(found, shard.id().index() == owner);
        }
    }

    #[test]
    fn test_global_root_independent_of_shard_order() {
        let manager = seeded();
        let mut roots: Vec<Hash> = manager.shards().iter().map(Shard::root_hash).collect();
        roots.reverse();
        assert_eq!(sorted_hex_root(&roots), manager.global_root_hash());
        roots.rotate_left(1);
        assert_eq!(sorted_hex_root(&roots), manager.global_root_hash());
    }

    #[test]
    fn test_global_root_deterministic_across_runs() {
        assert_eq!(seeded().global_root_hash(), seeded().global_root_hash());
        assert_eq!(seeded().root(), seeded().global_root_hash());
    }

    #[test]
    fn test_rebalance_threshold() {
        let mut manager = ShardManager::new(4).unwrap();
        for (shard, count) in [(0, 5), (1, 1), (2, 1), (3, 1)] {
            for key in keys_for_shard(&manager, shard, count) {
                manager.insert(&key, "1");
            }
        }
        let counts: Vec<u64> = manager.shards().iter().map(Shard::mutations).collect();
        assert_eq!(counts, vec![5, 1, 1, 1]);

        let report = manager.rebalance();
        assert_eq!(report.total_mutations, 8);
        assert_eq!(report.average, 2);
        assert_eq!(report.threshold, 4);
        assert_eq!(report.overloaded, vec![ShardId::new(0)]);
        assert!(manager.shards().iter().all(|shard| shard.mutations() == 0));
    }

    #[test]
    fn test_rebalance_balanced() {
        let mut manager = seeded();
        let report = manager.rebalance();
        assert!(report.is_balanced());
        assert_eq!(report.total_mutations, 2);
        assert_eq!(report.average, 0);
        assert!(manager.shards().iter().all(|shard| shard.mutations() == 0));
    }

    #[test]
    fn test_reset_mutations_keeps_state() {
        let mut manager = ShardManager::new(4).unwrap();
        for key in keys_for_shard(&manager, 0, 6) {
            manager.insert(&key, "1");
        }
        let root = manager.global_root_hash();

        manager.reset_mutations();

        assert!(manager.shards().iter().all(|shard| shard.mutations() == 0));
        assert_eq!(manager.global_root_hash(), root);
        let report = manager.rebalance();
        assert_eq!(report.total_mutations, 0);
        assert!(report.is_balanced());
    }

    #[test]
    fn test_proof_iff_found() {
        let mut manager = seeded();
        manager.insert("account.alice.nonce", "3");

        for key in [
            "account.alice.balance",
            "account.bob.balance",
            "account.alice",
            "account.carol.balance",
            "account.alice.balance.extra",
            "",
        ] {
            let found = manager.get(key).is_some();
            assert_eq!(manager.generate_compressed_proof(key).is_some(), found, "{}", key);
            if let Some(proof) = manager.generate_proof(key) {
                assert_eq!(proof.path().len(), segment_count(key));
                assert!(manager.verify_proof(&proof).is_ok());
            }
        }
    }

    #[test]
    fn test_prove_missing_key() {
        let manager = seeded();
        let err = manager.prove("account.carol.balance").unwrap_err();
        assert!(matches!(err, ShardStateError::KeyNotFound(_)));
        assert!(manager.require("account.carol.balance").is_err());
    }

    #[test]
    fn test_active_shards_follow_tick_parity() {
        let mut manager = ShardManager::new(4).unwrap();

        manager.set_tick(0);
        let even: Vec<usize> = manager.active_shards().map(|s| s.id().index()).collect();
        assert_eq!(even, vec![0, 2]);

        manager.set_tick(3);
        let odd: Vec<usize> = manager.active_shards().map(|s| s.id().index()).collect();
        assert_eq!(odd, vec![1, 3]);

        let dump = manager.render_active_shards();
        assert!(dump.starts_with("=== Tick 3 ===\n"));
        assert!(dump.contains("Shard 1:\n"));
        assert!(!dump.contains("Shard 2:\n"));
    }

    #[test]
    fn test_shard_lookup() {
        let manager = ShardManager::new(2).unwrap();
        assert!(manager.shard(ShardId::new(1)).is_ok());
        assert!(matches!(
            manager.shard(ShardId::new(2)),
            Err(ShardStateError::ShardNotFound(2))
        ));
    }

    #[test]
    fn test_snapshot_matches_global_root() {
        let mut manager = seeded();
        manager.set_tick(7);
        let snapshot = manager.snapshot();

        assert_eq!(snapshot.tick, 7);
        assert_eq!(snapshot.global_root, manager.global_root_hash());
        assert_eq!(snapshot.shard_roots.len(), 4);
        assert!(snapshot.verify());
    }
}
