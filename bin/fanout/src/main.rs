//! fanout is a CLI tool to deploy a contract to many networks through a deploy adapter.

mod cli;

use std::{path::Path, sync::Arc};

use alloy_core::primitives::{Address, B256};
use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::{Cell, Table, presets::UTF8_FULL};

use cli::{BackendArgs, Cli, Command};
use fanout_deploy::{
    AdapterClient, DeployError, DeploySession, DeploymentPlan, FanoutConfig, FoundryArtifacts,
    JsonRpcAdapter, SaltGenerator, SimulatedAdapter,
};

/// The adapter backend selected on the command line.
enum Backend {
    Live(JsonRpcAdapter),
    Simulated(SimulatedAdapter),
}

impl Backend {
    fn new(config: &FanoutConfig, args: BackendArgs) -> Result<Self> {
        if args.simulate {
            tracing::info!("Using the simulated adapter, nothing will be paid");
            return Ok(Self::Simulated(SimulatedAdapter::default()));
        }
        Ok(Self::Live(config.live_adapter()?))
    }

    /// The paying account: the configured one, or zero for dry runs without one.
    fn sender(&self, config: &FanoutConfig) -> Address {
        match self {
            Self::Live(adapter) => adapter.config().sender,
            Self::Simulated(_) => config.sender.unwrap_or_default(),
        }
    }

    async fn salt(&self, config: &FanoutConfig, plan: &DeploymentPlan) -> Result<B256> {
        if let Some(salt) = plan.salt {
            return Ok(salt);
        }

        let sender = self.sender(config);
        let mut generator = match self {
            Self::Live(adapter) => {
                SaltGenerator::with_entropy(sender, adapter.latest_block_entropy().await?)
            }
            Self::Simulated(_) => SaltGenerator::new(sender),
        };
        Ok(generator.next_salt())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    let config = || FanoutConfig::load(cli.config.as_deref());

    match cli.command {
        Command::Init { ref path, force } => init(path, force),
        Command::Networks => networks(&config()?),
        Command::Quote { ref plan, backend } => {
            let config = config()?;
            let plan = DeploymentPlan::load_from_file(plan)?;
            let backend = Backend::new(&config, backend)?;
            let salt = backend.salt(&config, &plan).await?;

            match backend {
                Backend::Live(adapter) => quote(&config, &plan, adapter, salt).await,
                Backend::Simulated(adapter) => quote(&config, &plan, adapter, salt).await,
            }
        }
        Command::Deploy { ref plan, backend } => {
            let config = config()?;
            let plan = DeploymentPlan::load_from_file(plan)?;
            let backend = Backend::new(&config, backend)?;
            let salt = backend.salt(&config, &plan).await?;

            match backend {
                Backend::Live(adapter) => deploy(&config, &plan, adapter, salt).await,
                Backend::Simulated(adapter) => deploy(&config, &plan, adapter, salt).await,
            }
        }
        Command::Address {
            salt,
            unique_per_chain,
            sender,
            backend,
        } => {
            let config = config()?;
            let backend = Backend::new(&config, backend)?;
            let sender = sender.unwrap_or_else(|| backend.sender(&config));

            let address = match backend {
                Backend::Live(adapter) => {
                    address(&config, adapter, sender, salt, unique_per_chain).await?
                }
                Backend::Simulated(adapter) => {
                    address(&config, adapter, sender, salt, unique_per_chain).await?
                }
            };
            println!("{address}");
            Ok(())
        }
        Command::Salt {
            count,
            sender,
            from_chain,
        } => {
            let config = config()?;
            let sender = sender.or(config.sender).unwrap_or_default();

            let generator = if from_chain {
                let entropy = config.live_adapter()?.latest_block_entropy().await?;
                SaltGenerator::with_entropy(sender, entropy)
            } else {
                SaltGenerator::new(sender)
            };

            for salt in generator.take(count) {
                println!("{salt}");
            }
            Ok(())
        }
    }
}

fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists, pass --force to overwrite it",
            path.display()
        );
    }

    FanoutConfig::default().save_to_file(path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn networks(config: &FanoutConfig) -> Result<()> {
    let catalog = config.catalog()?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Network", "Domain ID"]);
    for (name, id) in catalog.entries() {
        table.add_row(vec![Cell::new(name), Cell::new(id)]);
    }

    println!("{table}");
    Ok(())
}

fn session<A: AdapterClient>(
    config: &FanoutConfig,
    plan: &DeploymentPlan,
    adapter: A,
) -> Result<DeploySession<A, FoundryArtifacts>> {
    let mut session = DeploySession::new(Arc::new(config.catalog()?), adapter, config.artifacts())
        .with_timeouts(config.timeouts());
    plan.stage(&mut session)?;
    Ok(session)
}

async fn quote<A: AdapterClient>(
    config: &FanoutConfig,
    plan: &DeploymentPlan,
    adapter: A,
    salt: B256,
) -> Result<()> {
    let session = session(config, plan, adapter)?;

    let quoted = session
        .quote(&plan.contract, plan.gas_limit, salt, plan.unique_per_chain)
        .await
        .context("Failed to quote deployment")?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Network", "Domain ID", "Fee (wei)"]);
    for (target, fee) in session.targets().iter().zip(quoted.fees.fees()) {
        table.add_row(vec![
            Cell::new(&target.network),
            Cell::new(target.domain_id),
            Cell::new(fee),
        ]);
    }
    table.add_row(vec![
        Cell::new("total"),
        Cell::new(""),
        Cell::new(quoted.total_fee),
    ]);

    println!("{table}");
    println!("salt: {salt}");
    Ok(())
}

async fn deploy<A: AdapterClient>(
    config: &FanoutConfig,
    plan: &DeploymentPlan,
    adapter: A,
    salt: B256,
) -> Result<()> {
    let mut session = session(config, plan, adapter)?;

    let outcome = match session
        .deploy(&plan.contract, plan.gas_limit, salt, plan.unique_per_chain)
        .await
    {
        Ok(outcome) => outcome,
        Err(DeployError::AmbiguousSubmission { tx_hash, reason }) => {
            // Funds may already be spent: never suggest a plain retry here.
            let tx = tx_hash
                .map(|h| h.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            eprintln!("Deployment outcome is UNKNOWN ({reason}).");
            eprintln!("Transaction: {tx}");
            eprintln!("Check the transaction on-chain before deploying this plan again.");
            anyhow::bail!("deployment outcome unknown");
        }
        Err(e) if e.is_retriable() => {
            return Err(e).context("Deployment failed, nothing was paid; it is safe to retry");
        }
        Err(e) => return Err(e).context("Deployment failed"),
    };

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Field", "Value"]);
    table.add_row(vec![
        Cell::new("transaction"),
        Cell::new(outcome.receipt.tx_hash),
    ]);
    if let Some(block) = outcome.receipt.block_number {
        table.add_row(vec![Cell::new("block"), Cell::new(block)]);
    }
    table.add_row(vec![Cell::new("paid (wei)"), Cell::new(outcome.total_fee)]);
    table.add_row(vec![Cell::new("salt"), Cell::new(outcome.salt)]);
    table.add_row(vec![
        Cell::new("networks"),
        Cell::new(
            session
                .targets()
                .iter()
                .map(|t| t.network.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        ),
    ]);

    println!("{table}");
    Ok(())
}

async fn address<A: AdapterClient>(
    config: &FanoutConfig,
    adapter: A,
    sender: Address,
    salt: B256,
    unique_per_chain: bool,
) -> Result<Address> {
    let session = DeploySession::new(Arc::new(config.catalog()?), adapter, config.artifacts());

    session
        .compute_address(sender, salt, unique_per_chain)
        .await
        .context("Failed to compute deployment address")
}
