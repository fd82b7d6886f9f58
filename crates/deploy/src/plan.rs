//! Deployment plans: a TOML description of one multi-network deployment.
//!
//! ```toml
//! contract = "Counter.sol:Counter"
//! gas_limit = 3000000
//! unique_per_chain = false
//!
//! [[targets]]
//! network = "sepolia"
//! constructor_args = "0x000000000000000000000000000000000000000000000000000000000000002a"
//!
//! [[targets]]
//! network = "mumbai"
//! init_data = "0x8129fc1c"
//! ```

use std::path::Path;

use alloy_core::primitives::{B256, Bytes};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{AdapterClient, ArtifactResolver, DeploySession};

/// Default gas limit for the contract creation on each destination network.
pub const DEFAULT_GAS_LIMIT: u64 = 3_000_000;

fn default_gas_limit() -> u64 {
    DEFAULT_GAS_LIMIT
}

/// One network entry of a [`DeploymentPlan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedTarget {
    pub network: String,
    #[serde(default)]
    pub constructor_args: Bytes,
    #[serde(default)]
    pub init_data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentPlan {
    /// Contract identifier, e.g. `Counter.sol` or `Counter.sol:Counter`.
    pub contract: String,
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    #[serde(default)]
    pub unique_per_chain: bool,
    /// Fixed salt. A fresh one is generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<B256>,
    pub targets: Vec<PlannedTarget>,
}

impl DeploymentPlan {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read plan from {}", path.display()))?;
        content
            .parse()
            .with_context(|| format!("Invalid deployment plan {}", path.display()))
    }

    /// Add every planned target to `session`, in plan order.
    ///
    /// Stops at the first unknown network; targets added before it stay staged.
    pub fn stage<A, R>(&self, session: &mut DeploySession<A, R>) -> Result<()>
    where
        A: AdapterClient,
        R: ArtifactResolver,
    {
        for (i, target) in self.targets.iter().enumerate() {
            session
                .add_target(
                    &target.network,
                    target.constructor_args.clone(),
                    target.init_data.clone(),
                )
                .with_context(|| format!("Plan target #{} ({})", i, target.network))?;
        }

        tracing::info!(
            contract = %self.contract,
            targets = self.targets.len(),
            "Deployment plan staged"
        );

        Ok(())
    }
}

impl std::str::FromStr for DeploymentPlan {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let plan: Self = toml::from_str(s).context("Failed to parse plan as TOML")?;
        if plan.targets.is_empty() {
            anyhow::bail!("Plan for {} has no targets", plan.contract);
        }
        Ok(plan)
    }
}
