//! Ringflight CLI - inspect peer routing and call coalescing.

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "ringflight")]
#[command(author, version, about = "Ringflight - consistent-hash routing and call coalescing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a config file (default: ringflight.toml in this or a parent directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default ringflight.toml
    Init {
        /// Directory to write into (default: current directory)
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Show which peer owns each key
    Route {
        /// Keys to route
        #[arg(required = true)]
        keys: Vec<String>,

        /// Peers to use instead of the configured ones (comma separated)
        #[arg(short, long, value_delimiter = ',')]
        nodes: Vec<String>,

        /// Also list this many fallback peers per key
        #[arg(short, long, default_value = "0")]
        fallbacks: usize,
    },

    /// Report how evenly keys spread across peers
    Distribution {
        /// Peers to use instead of the configured ones (comma separated)
        #[arg(short, long, value_delimiter = ',')]
        nodes: Vec<String>,

        /// Number of keys to sample
        #[arg(short, long, default_value = "10000")]
        samples: usize,
    },

    /// Run concurrent calls for one key and count executions
    Coalesce {
        /// Concurrent callers per round
        #[arg(short, long, default_value = "10")]
        callers: usize,

        /// Simulated load time in milliseconds
        #[arg(short, long, default_value = "100")]
        delay_ms: u64,

        /// Number of sequential rounds
        #[arg(short, long, default_value = "2")]
        rounds: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init { path } => commands::init::run(path),
        Commands::Route {
            keys,
            nodes,
            fallbacks,
        } => {
            let config = Config::load(cli.config.as_deref())?.with_nodes(nodes);
            commands::route::run(&config, &keys, fallbacks)
        }
        Commands::Distribution { nodes, samples } => {
            let config = Config::load(cli.config.as_deref())?.with_nodes(nodes);
            commands::distribution::run(&config, samples)
        }
        Commands::Coalesce {
            callers,
            delay_ms,
            rounds,
        } => commands::coalesce::run(callers, delay_ms, rounds),
    }
}
