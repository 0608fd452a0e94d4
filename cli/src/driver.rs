//! Tick driver
//!
//! Applies a fixed set of writes every tick, dumps the active shards, runs the
//! rebalance pass, and proves a few keys against the fresh state.

use shardstate_core::{SimulationConfig, StateMutator};
use shardstate_state::{
    CompressedProof, RebalanceReport, RootSnapshot, ShardManager, SnapshotHistory,
};
use std::fmt;
use std::time::Duration;
use tracing::info;

/// Everything observed during one tick
pub struct TickReport {
    pub tick: u64,
    pub active_dump: String,
    pub rebalance: RebalanceReport,
    pub snapshot: RootSnapshot,
    /// Shards whose root moved since the previous tick
    pub changed_shards: Option<usize>,
    pub proofs: Vec<(String, Option<CompressedProof>)>,
}

impl fmt::Display for TickReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n===== TICK {} =====", self.tick)?;
        write!(f, "{}", self.active_dump)?;
        writeln!(f, "Rebalancing shards...")?;
        for shard in &self.rebalance.overloaded {
            writeln!(f, "Shard {} overloaded, consider splitting", shard)?;
        }
        writeln!(f, "🌐 Global Root Hash: {}", self.snapshot.global_root)?;
        for (key, proof) in &self.proofs {
            match proof {
                Some(proof) => writeln!(f, "✔️  Compressed Proof for '{}': {}", key, proof)?,
                None => writeln!(f, "❌  Key '{}' not found for proof.", key)?,
            }
        }
        Ok(())
    }
}

pub struct Simulation {
    manager: ShardManager,
    config: SimulationConfig,
    history: SnapshotHistory,
}

impl Simulation {
    pub fn new(manager: ShardManager, config: SimulationConfig) -> Self {
        Self {
            manager,
            config,
            history: SnapshotHistory::default(),
        }
    }

    pub fn manager(&self) -> &ShardManager {
        &self.manager
    }

    /// Run a single tick to completion
    pub fn run_tick(&mut self, tick: u64) -> TickReport {
        self.manager.set_tick(tick);

        for entry in &self.config.writes {
            self.manager.insert(&entry.key, &entry.value);
        }

        let active_dump = self.manager.render_active_shards();
        let rebalance = self.manager.rebalance();
        let snapshot = self.manager.snapshot();

        let changed_shards = self
            .history
            .latest()
            .map(|previous| snapshot.changed_since(previous).len());
        self.history.add(snapshot.clone());

        let proofs = self
            .config
            .proof_keys
            .iter()
            .map(|key| (key.clone(), self.manager.generate_compressed_proof(key)))
            .collect();

        TickReport {
            tick,
            active_dump,
            rebalance,
            snapshot,
            changed_shards,
            proofs,
        }
    }

    /// Run every configured tick, pausing between them
    pub async fn run(&mut self) -> Vec<TickReport> {
        let interval = Duration::from_millis(self.config.tick_interval_ms);
        let mut reports = Vec::new();

        for tick in 0..self.config.ticks {
            let report = self.run_tick(tick);
            print!("{}", report);
            if let Some(changed) = report.changed_shards {
                info!("Tick {}: {} shard roots changed", tick, changed);
            }
            reports.push(report);

            if tick + 1 < self.config.ticks {
                tokio::time::sleep(interval).await;
            }
        }

        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shardstate_core::StateProvider;

    fn simulation() -> Simulation {
        let config = SimulationConfig {
            ticks: 3,
            tick_interval_ms: 0,
            ..SimulationConfig::default()
        };
        Simulation::new(ShardManager::new(4).unwrap(), config)
    }

    #[test]
    fn test_tick_applies_writes_and_proves() {
        let mut sim = simulation();
        let report = sim.run_tick(0);

        assert_eq!(sim.manager().get("account.dave.nonce"), Some("1"));
        assert_eq!(report.proofs.len(), 2);
        assert!(report.proofs.iter().all(|(_, proof)| proof.is_some()));
        assert!(report.snapshot.verify());
        assert_eq!(report.changed_shards, None);
        assert_eq!(report.rebalance.total_mutations, 4);
    }

    #[test]
    fn test_repeated_writes_keep_root() {
        let mut sim = simulation();
        let first = sim.run_tick(0);
        let second = sim.run_tick(1);

        assert_eq!(first.snapshot.global_root, second.snapshot.global_root);
        assert_eq!(second.changed_shards, Some(0));
        assert!(sim.manager().shards().iter().all(|s| s.mutations() == 0));
    }

    #[test]
    fn test_report_display() {
        let mut sim = simulation();
        let text = sim.run_tick(1).to_string();

        assert!(text.contains("===== TICK 1 ====="));
        assert!(text.contains("=== Tick 1 ==="));
        assert!(text.contains("Global Root Hash: "));
        assert!(text.contains("Compressed Proof for 'account.alice.balance'"));
    }

    #[tokio::test]
    async fn test_run_all_ticks() {
        let mut sim = simulation();
        let reports = sim.run().await;

        assert_eq!(reports.len(), 3);
        assert_eq!(reports[2].tick, 2);
    }
}
