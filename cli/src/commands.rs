//! CLI Commands
//!
//! Every inspection command rebuilds the store from a JSON state file of
//! `{ "dotted.key": "value" }` pairs; nothing is persisted between runs.

use anyhow::Context;
use serde_json::json;
use shardstate_core::{ShardStateError, StateMutator, StateProvider};
use shardstate_state::ShardManager;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Load a state file and insert every entry into a fresh manager
pub fn load_store(path: &Path, shard_count: usize) -> anyhow::Result<ShardManager> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading state file {}", path.display()))?;
    let entries: BTreeMap<String, String> = serde_json::from_str(&content)
        .with_context(|| format!("parsing state file {}", path.display()))?;

    let mut manager = ShardManager::new(shard_count)?;
    manager.apply_batch(entries.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    // Loading is not a workload; start the counters at zero
    manager.reset_mutations();

    info!(
        "Loaded {} entries into {} shards from {}",
        entries.len(),
        shard_count,
        path.display()
    );
    Ok(manager)
}

pub fn show_root(manager: &ShardManager) {
    println!("Global Root: {}", manager.global_root_hash());
    println!("{:<8} {}", "Shard", "Root");
    println!("{:-<8} {:-<64}", "", "");
    for shard in manager.shards() {
        println!("{:<8} {}", shard.id(), shard.root_hash());
    }
}

pub fn show_value(manager: &ShardManager, key: &str) -> anyhow::Result<()> {
    let value = manager.require(key)?;
    println!("{}", value);
    Ok(())
}

pub fn show_proof(manager: &ShardManager, key: &str, full: bool) -> anyhow::Result<()> {
    if !full {
        let proof = manager
            .generate_compressed_proof(key)
            .ok_or_else(|| ShardStateError::KeyNotFound(key.to_string()))?;
        println!("{}", serde_json::to_string_pretty(&proof)?);
        return Ok(());
    }

    let proof = manager.prove(key)?;
    let shard = manager.shard_for_key(key);

    let output = json!({
        "shard": shard.id(),
        "shard_root": shard.root_hash(),
        "verified": manager.verify_proof(&proof).is_ok(),
        "compressed": proof.compress(),
        "proof": proof,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn write_snapshot(manager: &ShardManager, output: &Path) -> anyhow::Result<()> {
    let snapshot = manager.snapshot();
    std::fs::write(output, snapshot.to_json()?)
        .with_context(|| format!("writing snapshot {}", output.display()))?;
    println!("Snapshot saved to: {}", output.display());
    Ok(())
}
