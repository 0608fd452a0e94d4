//! Configuration types for SHARDSTATE

use crate::error::{ShardStateError, ShardStateResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Instance name for logging
    pub name: String,

    /// Store configuration
    pub store: StoreConfig,

    /// Tick driver configuration
    pub simulation: SimulationConfig,

    /// Logging level
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "shardstate".to_string(),
            store: StoreConfig::default(),
            simulation: SimulationConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Parse from JSON, then validate
    pub fn from_json(json: &str) -> ShardStateResult<Self> {
        let config: AppConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file on disk
    pub fn load<P: AsRef<Path>>(path: P) -> ShardStateResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> ShardStateResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> ShardStateResult<()> {
        self.store.validate()?;
        self.simulation.validate()
    }
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Number of shards, fixed for the lifetime of a manager
    pub shard_count: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { shard_count: 4 }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> ShardStateResult<()> {
        if self.shard_count == 0 {
            return Err(ShardStateError::InvalidShardCount(self.shard_count));
        }
        Ok(())
    }
}

/// A key/value pair written on every tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedEntry {
    pub key: String,
    pub value: String,
}

impl SeedEntry {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

/// Tick driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of ticks to run
    pub ticks: u64,

    /// Pause between ticks in milliseconds
    pub tick_interval_ms: u64,

    /// Writes applied on every tick
    pub writes: Vec<SeedEntry>,

    /// Keys proven after every tick
    pub proof_keys: Vec<String>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ticks: 4,
            tick_interval_ms: 1000,
            writes: vec![
                SeedEntry::new("account.alice.balance", "100"),
                SeedEntry::new("account.bob.balance", "200"),
                SeedEntry::new("account.carol.balance", "300"),
                SeedEntry::new("account.dave.nonce", "1"),
            ],
            proof_keys: vec![
                "account.alice.balance".to_string(),
                "account.bob.balance".to_string(),
            ],
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> ShardStateResult<()> {
        if self.writes.is_empty() {
            return Err(ShardStateError::ConfigError(
                "simulation needs at least one write".into(),
            ));
        }
        Ok(())
    }
}
