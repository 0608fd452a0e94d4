//! A single state shard

use shardstate_core::{split_key, Hash, Hashable, ShardId, StateMutator, StateProvider, StateRoot};
use tracing::debug;

use crate::proof::{CompressedProof, MerkleProof};
use crate::trie::TrieNode;

/// One partition of the key space with its own trie
#[derive(Debug, Clone)]
pub struct Shard {
    id: ShardId,
    root: TrieNode,
    /// Writes since the last rebalance pass
    mutations: u64,
}

impl Shard {
    pub fn new(id: ShardId) -> Self {
        Self {
            id,
            root: TrieNode::root(),
            mutations: 0,
        }
    }

    pub fn id(&self) -> ShardId {
        self.id
    }

    pub fn root_node(&self) -> &TrieNode {
        &self.root
    }

    pub fn root_hash(&self) -> Hash {
        self.root.digest()
    }

    pub fn mutations(&self) -> u64 {
        self.mutations
    }

    /// Zero the mutation counter, returning the previous count
    pub fn reset_mutations(&mut self) -> u64 {
        std::mem::take(&mut self.mutations)
    }

    /// Build an inclusion proof, or `None` if the key does not resolve
    pub fn generate_proof(&self, key: &str) -> Option<MerkleProof> {
        let mut proof = MerkleProof::new(key);
        if self.root.generate_proof(&split_key(key), &mut proof) {
            Some(proof)
        } else {
            debug!(shard = %self.id, key, "No proof for key");
            None
        }
    }

    pub fn generate_compressed_proof(&self, key: &str) -> Option<CompressedProof> {
        self.generate_proof(key).map(|proof| proof.compress())
    }

    /// Recursive dump of every node's segment, value, and digest
    pub fn dump(&self) -> String {
        let mut out = format!("Shard {}:\n", self.id);
        self.root.render("  ", &mut out);
        out
    }
}

impl Hashable for Shard {
    fn hash(&self) -> Hash {
        self.root.digest()
    }
}

impl StateProvider for Shard {
    fn root(&self) -> StateRoot {
        self.root.digest()
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.root.get(&split_key(key))
    }
}

impl StateMutator for Shard {
    fn insert(&mut self, key: &str, value: &str) {
        self.root.insert(&split_key(key), value);
        self.mutations += 1;
        debug!(
            shard = %self.id,
            key,
            root = %self.root.digest().short(),
            mutations = self.mutations,
            "Set key"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_insert_get() {
        let mut shard = Shard::new(ShardId::new(0));
        let empty_root = shard.root();

        shard.insert("account.alice.balance", "100");

        assert_eq!(shard.get("account.alice.balance"), Some("100"));
        assert_eq!(shard.get("account.alice.nonce"), None);
        assert!(shard.exists("account.alice"));
        assert_ne!(shard.root(), empty_root);
        assert_eq!(shard.hash(), shard.root_hash());
    }

    #[test]
    fn test_require_missing_key() {
        let shard = Shard::new(ShardId::new(1));
        let err = shard.require("missing.key").unwrap_err();
        assert!(matches!(err, shardstate_core::ShardStateError::KeyNotFound(ref k) if k == "missing.key"));
    }

    #[test]
    fn test_mutation_counter() {
        let mut shard = Shard::new(ShardId::new(2));
        shard.apply_batch([("a.b", "1"), ("a.c", "2"), ("a.b", "3")]);

        assert_eq!(shard.mutations(), 3);
        assert_eq!(shard.reset_mutations(), 3);
        assert_eq!(shard.mutations(), 0);
        assert_eq!(shard.get("a.b"), Some("3"));
    }

    #[test]
    fn test_shard_proofs() {
        let mut shard = Shard::new(ShardId::new(0));
        shard.insert("account.alice.balance", "100");
        shard.insert("account.bob.balance", "200");

        let proof = shard.generate_proof("account.alice.balance").unwrap();
        assert_eq!(proof.path().len(), 3);
        assert!(proof.verify(&shard.root()).is_ok());

        let compressed = shard.generate_compressed_proof("account.alice.balance").unwrap();
        assert_eq!(compressed.len(), 1);

        assert!(shard.generate_proof("account.carol.balance").is_none());
        assert!(shard.generate_compressed_proof("account.carol.balance").is_none());
    }

    #[test]
    fn test_dump_lists_every_node() {
        let mut shard = Shard::new(ShardId::new(3));
        shard.insert("a.b", "1");

        let dump = shard.dump();
        assert!(dump.starts_with("Shard 3:\n"));
        assert_eq!(dump.lines().count(), 4);
        assert!(dump.contains("    [a]: "));
    }
}
