use std::path::PathBuf;

use alloy_core::primitives::{Address, B256};
use clap::{Args, Parser, Subcommand};
use fanout_deploy::CONFIG_FILENAME;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "fanout")]
#[command(
    author,
    version,
    about = "Deploy one contract to many networks with a single adapter payment"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(
        short,
        long,
        global = true,
        env = "FANOUT_VERBOSITY",
        default_value_t = LevelFilter::INFO
    )]
    pub verbosity: LevelFilter,

    /// Path to a Fanout.toml configuration file, or a directory containing one.
    ///
    /// If not provided, ./Fanout.toml is used when present.
    #[arg(long, alias = "conf", global = true, env = "FANOUT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write a default configuration file.
    Init {
        /// Where to write the configuration.
        #[arg(default_value = CONFIG_FILENAME)]
        path: PathBuf,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },

    /// List the networks deployments can target.
    Networks,

    /// Price a deployment plan without paying for it.
    Quote {
        /// The deployment plan (TOML).
        plan: PathBuf,
        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Quote a deployment plan and pay the adapter to deploy it.
    Deploy {
        /// The deployment plan (TOML).
        plan: PathBuf,
        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Predict the address a deployment will get.
    Address {
        /// The deployment salt (32 bytes, hex).
        #[arg(long)]
        salt: B256,
        /// Whether the address should differ on each network.
        #[arg(long)]
        unique_per_chain: bool,
        /// The deploying account. Defaults to the configured sender.
        #[arg(long)]
        sender: Option<Address>,
        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Generate fresh deployment salts.
    Salt {
        /// How many salts to print.
        #[arg(long, short = 'n', default_value_t = 1)]
        count: usize,
        /// The deploying account mixed into each salt. Defaults to the configured sender.
        #[arg(long)]
        sender: Option<Address>,
        /// Seed from the latest block of the configured node instead of the OS.
        #[arg(long)]
        from_chain: bool,
    },
}

#[derive(Debug, Clone, Copy, Args)]
pub struct BackendArgs {
    /// Use the local simulated adapter instead of the configured node.
    #[arg(long, env = "FANOUT_SIMULATE")]
    pub simulate: bool,
}
