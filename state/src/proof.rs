//! Inclusion proofs for trie keys

use serde::{Deserialize, Serialize};
use shardstate_core::{Hash, ShardStateError, ShardStateResult, ROOT_SEGMENT};
use std::fmt;

use crate::trie::node_digest;

/// Digest of a child that is not on the proven path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofSibling {
    pub segment: String,
    pub digest: Hash,
}

/// One level of a proof: the child taken and everything next to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    /// Segment of the child the path descends into
    pub segment: String,
    /// Value stored at the parent of that child
    pub parent_value: String,
    /// Other children of the parent, ascending by segment
    pub siblings: Vec<ProofSibling>,
}

/// Inclusion proof for a single key, built fresh per request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    pub key: String,
    /// Root to target, one entry per key segment
    pub steps: Vec<ProofStep>,
    /// Value stored at the target
    pub value: String,
    /// Children of the target node, ascending by segment
    pub leaf_children: Vec<ProofSibling>,
}

impl MerkleProof {
    /// Empty accumulator for `key`
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            steps: Vec::new(),
            value: String::new(),
            leaf_children: Vec::new(),
        }
    }

    /// Segments traversed from the root to the target
    pub fn path(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.segment.as_str()).collect()
    }

    /// Every sibling collected, root level first
    pub fn siblings(&self) -> impl Iterator<Item = &ProofSibling> {
        self.steps.iter().flat_map(|step| step.siblings.iter())
    }

    /// Drop sibling identities, keeping only their digests
    pub fn compress(&self) -> CompressedProof {
        compress(self)
    }

    /// Recompute the shard root this proof commits to
    pub fn computed_root(&self) -> Hash {
        let leaf_segment = self
            .steps
            .last()
            .map(|step| step.segment.as_str())
            .unwrap_or(ROOT_SEGMENT);

        let mut current = node_digest(
            leaf_segment,
            &self.value,
            self.leaf_children
                .iter()
                .map(|child| (child.segment.as_str(), child.digest)),
        );

        for (depth, step) in self.steps.iter().enumerate().rev() {
            let parent_segment = match depth {
                0 => ROOT_SEGMENT,
                _ => self.steps[depth - 1].segment.as_str(),
            };

            let mut children: Vec<(&str, Hash)> = step
                .siblings
                .iter()
                .map(|sibling| (sibling.segment.as_str(), sibling.digest))
                .collect();
            children.push((step.segment.as_str(), current));
            children.sort_by(|a, b| a.0.cmp(b.0));

            current = node_digest(parent_segment, &step.parent_value, children);
        }

        current
    }

    /// Check this proof against a shard root
    pub fn verify(&self, root: &Hash) -> ShardStateResult<()> {
        let computed = self.computed_root();
        if computed != *root {
            return Err(ShardStateError::ProofVerificationFailed(format!(
                "key {} recomputes to {}, expected {}",
                self.key,
                computed.short(),
                root.short()
            )));
        }
        Ok(())
    }
}

/// Sibling digests only, in collection order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompressedProof(pub Vec<Hash>);

impl CompressedProof {
    pub fn hashes(&self) -> &[Hash] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowercase hex rendering of each digest
    pub fn to_hex(&self) -> Vec<String> {
        self.0.iter().map(Hash::to_hex).collect()
    }
}

impl fmt::Display for CompressedProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.to_hex().join(" "))
    }
}

/// Strip sibling segments from a proof, keeping the digests in order
pub fn compress(proof: &MerkleProof) -> CompressedProof {
    CompressedProof(proof.siblings().map(|sibling| sibling.digest).collect())
}
