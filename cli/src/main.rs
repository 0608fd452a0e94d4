//! SHARDSTATE CLI - tick driver and state inspection

mod commands;
mod driver;

use clap::{Parser, Subcommand};
use shardstate_core::AppConfig;
use shardstate_state::ShardManager;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::driver::Simulation;

#[derive(Parser)]
#[command(name = "shardstate")]
#[command(about = "SHARDSTATE - sharded, hash-committed key-value state")]
#[command(version)]
struct Cli {
    /// Configuration file path (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (overrides the configuration file)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the tick-driven simulation
    Simulate {
        /// Number of ticks
        #[arg(long)]
        ticks: Option<u64>,

        /// Number of shards
        #[arg(long)]
        shards: Option<usize>,

        /// Pause between ticks in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Print the global root and every shard root
    Root {
        /// State file: a JSON object of key/value pairs
        #[arg(short, long)]
        state: PathBuf,

        /// Number of shards
        #[arg(long)]
        shards: Option<usize>,
    },

    /// Look up a single key
    Get {
        /// Dotted key, e.g. account.alice.balance
        key: String,

        #[arg(short, long)]
        state: PathBuf,

        #[arg(long)]
        shards: Option<usize>,
    },

    /// Print an inclusion proof for a key
    Prove {
        key: String,

        #[arg(short, long)]
        state: PathBuf,

        #[arg(long)]
        shards: Option<usize>,

        /// Print the full, verifiable proof instead of the compressed digests
        #[arg(long)]
        full: bool,
    },

    /// Write a snapshot of every shard root
    Snapshot {
        #[arg(short, long)]
        state: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        #[arg(long)]
        shards: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }

    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::new(&config.log_level))
        .with_target(false)
        .init();

    match cli.command {
        Commands::Simulate {
            ticks,
            shards,
            interval_ms,
        } => {
            if let Some(ticks) = ticks {
                config.simulation.ticks = ticks;
            }
            if let Some(interval_ms) = interval_ms {
                config.simulation.tick_interval_ms = interval_ms;
            }
            if let Some(shards) = shards {
                config.store.shard_count = shards;
            }
            config.validate()?;

            info!(
                "Starting {} with {} shards for {} ticks",
                config.name, config.store.shard_count, config.simulation.ticks
            );

            let manager = ShardManager::from_config(&config.store)?;
            let mut simulation = Simulation::new(manager, config.simulation.clone());
            simulation.run().await;

            info!("Final global root: {}", simulation.manager().global_root_hash());
        }

        Commands::Root { state, shards } => {
            let manager = commands::load_store(&state, shards.unwrap_or(config.store.shard_count))?;
            commands::show_root(&manager);
        }

        Commands::Get { key, state, shards } => {
            let manager = commands::load_store(&state, shards.unwrap_or(config.store.shard_count))?;
            if let Err(e) = commands::show_value(&manager, &key) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }

        Commands::Prove {
            key,
            state,
            shards,
            full,
        } => {
            let manager = commands::load_store(&state, shards.unwrap_or(config.store.shard_count))?;
            if let Err(e) = commands::show_proof(&manager, &key, full) {
                eprintln!("❌ {}", e);
                std::process::exit(1);
            }
        }

        Commands::Snapshot {
            state,
            output,
            shards,
        } => {
            let manager = commands::load_store(&state, shards.unwrap_or(config.store.shard_count))?;
            commands::write_snapshot(&manager, &output)?;
        }
    }

    Ok(())
}
