//! Core types for SHARDSTATE
//!
//! Defines fundamental data structures used across the system.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Delimiter between the segments of a key path
pub const PATH_DELIMITER: char = '.';

/// Segment carried by every shard's root node
pub const ROOT_SEGMENT: &str = "root";

/// 32-byte hash type; serializes as lowercase hex
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    pub const ZERO: Hash = Hash([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering, 64 characters
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Hash(arr))
    }

    /// First 12 hex characters, for log lines
    pub fn short(&self) -> String {
        self.to_hex()[..12].to_string()
    }
}

impl Default for Hash {
    fn default() -> Self {
        Hash::ZERO
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Index of a shard inside a manager
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct ShardId(pub usize);

impl ShardId {
    pub fn new(value: usize) -> Self {
        ShardId(value)
    }

    pub fn index(&self) -> usize {
        self.0
    }

    /// Parity check used by the active-shard window
    pub fn is_active_at(&self, tick: u64) -> bool {
        (self.0 as u64) % 2 == tick % 2
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShardId({})", self.0)
    }
}

/// Split a dotted key into its path segments.
///
/// No escaping is supported: every `.` starts a new segment, so `"a..b"`
/// yields an empty middle segment and `""` yields a single empty segment.
pub fn split_key(key: &str) -> Vec<&str> {
    key.split(PATH_DELIMITER).collect()
}

/// Number of segments a key resolves to
pub fn segment_count(key: &str) -> usize {
    key.split(PATH_DELIMITER).count()
}

/// Shard root hash
pub type StateRoot = Hash;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_hex() {
        let hash = Hash([7u8; 32]);
        let hex = hash.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(hex, hex.to_lowercase());
        assert_eq!(Hash::from_hex(&hex).unwrap(), hash);
    }

    #[test]
    fn test_hash_serializes_as_hex() {
        let hash = Hash([0xab; 32]);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(32)));

        let restored: Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, hash);
        assert!(serde_json::from_str::<Hash>("\"abcd\"").is_err());
    }

    #[test]
    fn test_hash_from_hex_wrong_length() {
        assert!(Hash::from_hex("abcd").is_err());
    }

    #[test]
    fn test_split_key() {
        assert_eq!(split_key("account.alice.balance"), vec!["account", "alice", "balance"]);
        assert_eq!(split_key("single"), vec!["single"]);
        assert_eq!(split_key(""), vec![""]);
        assert_eq!(segment_count("a..b"), 3);
    }

    #[test]
    fn test_shard_parity() {
        assert!(ShardId::new(0).is_active_at(2));
        assert!(!ShardId::new(1).is_active_at(2));
        assert!(ShardId::new(3).is_active_at(1));
    }
}
