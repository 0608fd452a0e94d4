//! Authenticated path trie
//!
//! Every node is keyed by one path segment and commits to its own value and
//! to the digests of all of its children. Children live in a `BTreeMap`, so
//! they are always folded into the parent digest in ascending segment order
//! and the digest does not depend on insertion order.

use shardstate_core::{Hash, Hashable, ROOT_SEGMENT};
use shardstate_crypto::hashing::IncrementalHasher;
use std::collections::BTreeMap;

use crate::proof::{MerkleProof, ProofSibling, ProofStep};

/// Compute a node digest.
///
/// `H(segment ‖ value ‖ Σ(child_segment ‖ hex(child_digest)))`. The caller
/// must supply children in ascending segment order.
pub fn node_digest<'a, I>(segment: &str, value: &str, children: I) -> Hash
where
    I: IntoIterator<Item = (&'a str, Hash)>,
{
    let mut hasher = IncrementalHasher::new();
    hasher.update(segment.as_bytes());
    hasher.update(value.as_bytes());
    for (child_segment, child_digest) in children {
        hasher.update(child_segment.as_bytes());
        hasher.update(child_digest.to_hex().as_bytes());
    }
    hasher.finalize()
}

/// A node in the authenticated trie
#[derive(Debug, Clone)]
pub struct TrieNode {
    segment: String,
    /// Empty for nodes that only route to descendants
    value: String,
    children: BTreeMap<String, TrieNode>,
    digest: Hash,
}

impl TrieNode {
    /// Create a node with no children
    pub fn new(segment: &str, value: &str) -> Self {
        let mut node = Self {
            segment: segment.to_string(),
            value: value.to_string(),
            children: BTreeMap::new(),
            digest: Hash::ZERO,
        };
        node.update_digest();
        node
    }

    /// Create an empty shard root
    pub fn root() -> Self {
        Self::new(ROOT_SEGMENT, "")
    }

    pub fn segment(&self) -> &str {
        &self.segment
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn digest(&self) -> Hash {
        self.digest
    }

    pub fn child(&self, segment: &str) -> Option<&TrieNode> {
        self.children.get(segment)
    }

    /// Children in ascending segment order
    pub fn children(&self) -> impl Iterator<Item = &TrieNode> {
        self.children.values()
    }

    /// Number of nodes in this subtree, including this one
    pub fn node_count(&self) -> usize {
        1 + self.children.values().map(TrieNode::node_count).sum::<usize>()
    }

    /// Insert `value` at the path below this node.
    ///
    /// Missing intermediate nodes are created with an empty value. The digest
    /// of every node along the path is recomputed on the way back up.
    pub fn insert(&mut self, segments: &[&str], value: &str) {
        match segments.split_first() {
            None => {
                self.value = value.to_string();
            }
            Some((head, rest)) => {
                self.children
                    .entry((*head).to_string())
                    .or_insert_with(|| TrieNode::new(head, ""))
                    .insert(rest, value);
            }
        }
        self.update_digest();
    }

    /// Look up the value stored at the path below this node
    pub fn get(&self, segments: &[&str]) -> Option<&str> {
        match segments.split_first() {
            None => Some(&self.value),
            Some((head, rest)) => self.children.get(*head)?.get(rest),
        }
    }

    /// Recompute this node's digest from its value and its children's digests
    pub fn update_digest(&mut self) {
        self.digest = node_digest(
            &self.segment,
            &self.value,
            self.children
                .iter()
                .map(|(segment, child)| (segment.as_str(), child.digest)),
        );
    }

    /// Walk `segments`, recording siblings at every level into `proof`.
    ///
    /// Returns `false` as soon as a segment has no matching child; the
    /// accumulator is then incomplete and must be discarded.
    pub fn generate_proof(&self, segments: &[&str], proof: &mut MerkleProof) -> bool {
        let Some((head, rest)) = segments.split_first() else {
            proof.value = self.value.clone();
            proof.leaf_children = self.sibling_entries(None);
            return true;
        };

        let Some(child) = self.children.get(*head) else {
            return false;
        };

        proof.steps.push(ProofStep {
            segment: (*head).to_string(),
            parent_value: self.value.clone(),
            siblings: self.sibling_entries(Some(*head)),
        });
        child.generate_proof(rest, proof)
    }

    /// Append a recursive dump of this subtree to `out`
    pub fn render(&self, indent: &str, out: &mut String) {
        out.push_str(&format!(
            "{}[{}]: {} | Hash: {}\n",
            indent, self.segment, self.value, self.digest
        ));
        let nested = format!("{}  ", indent);
        for child in self.children.values() {
            child.render(&nested, out);
        }
    }

    fn sibling_entries(&self, exclude: Option<&str>) -> Vec<ProofSibling> {
        self.children
            .iter()
            .filter(|(segment, _)| Some(segment.as_str()) != exclude)
            .map(|(segment, child)| ProofSibling {
                segment: segment.clone(),
                digest: child.digest,
            })
            .collect()
    }
}

impl Default for TrieNode {
    fn default() -> Self {
        TrieNode::root()
    }
}

impl Hashable for TrieNode {
    fn hash(&self) -> Hash {
        self.digest
    }
}
