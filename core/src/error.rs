//! Error types for SHARDSTATE

use thiserror::Error;

/// Main error type for SHARDSTATE
#[derive(Error, Debug)]
pub enum ShardStateError {
    // ============ Lookup Errors ============
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Shard not found: {0}")]
    ShardNotFound(usize),

    // ============ Store Errors ============
    #[error("Invalid shard count: {0} (must be at least 1)")]
    InvalidShardCount(usize),

    #[error("Proof verification failed: {0}")]
    ProofVerificationFailed(String),

    #[error("Invalid hash: {0}")]
    InvalidHash(String),

    // ============ Configuration Errors ============
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ============ Encoding Errors ============
    #[error("Serialization failed: {0}")]
    SerializationError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    // ============ General Errors ============
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type for SHARDSTATE operations
pub type ShardStateResult<T> = Result<T, ShardStateError>;

impl From<std::io::Error> for ShardStateError {
    fn from(err: std::io::Error) -> Self {
        ShardStateError::StorageError(err.to_string())
    }
}

impl From<bincode::Error> for ShardStateError {
    fn from(err: bincode::Error) -> Self {
        ShardStateError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for ShardStateError {
    fn from(err: serde_json::Error) -> Self {
        ShardStateError::SerializationError(err.to_string())
    }
}

impl From<hex::FromHexError> for ShardStateError {
    fn from(err: hex::FromHexError) -> Self {
        ShardStateError::InvalidHash(err.to_string())
    }
}
