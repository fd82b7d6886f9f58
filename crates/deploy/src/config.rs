//! Operator configuration.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    time::Duration,
};

use alloy_core::primitives::Address;
use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    DEFAULT_QUOTE_TIMEOUT, DEFAULT_SUBMIT_TIMEOUT, FoundryArtifacts, JsonRpcAdapter,
    JsonRpcAdapterConfig, NetworkCatalog, SessionTimeouts,
    adapter::{DEFAULT_RECEIPT_POLL_INTERVAL, DEFAULT_RECEIPT_TIMEOUT},
    artifacts::DEFAULT_ARTIFACTS_DIR,
    rpc::DEFAULT_REQUEST_TIMEOUT,
};

/// The default name for the fanout configuration file.
pub const CONFIG_FILENAME: &str = "Fanout.toml";

/// Prefix of environment variables overriding configuration keys.
pub const ENV_PREFIX: &str = "FANOUT_";

/// Configuration shared by every deployment session.
///
/// Loaded from TOML and overridden by `FANOUT_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FanoutConfig {
    /// JSON-RPC endpoint of the node used to reach the adapter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<Url>,
    /// Address of the deploy adapter contract.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adapter_address: Option<Address>,
    /// Account paying for deployments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<Address>,
    /// Foundry output directory holding compiled artifacts.
    pub artifacts_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub quote_timeout_secs: u64,
    pub submit_timeout_secs: u64,
    pub receipt_poll_interval_ms: u64,
    /// Extra networks registered on top of the built-in catalog.
    pub networks: BTreeMap<String, u32>,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            adapter_address: None,
            sender: None,
            artifacts_dir: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            quote_timeout_secs: DEFAULT_QUOTE_TIMEOUT.as_secs(),
            submit_timeout_secs: DEFAULT_SUBMIT_TIMEOUT.as_secs(),
            receipt_poll_interval_ms: DEFAULT_RECEIPT_POLL_INTERVAL.as_millis() as u64,
            networks: BTreeMap::new(),
        }
    }
}

impl FanoutConfig {
    /// Load configuration: defaults, then the TOML file, then environment variables.
    ///
    /// A missing file is not an error; a directory is searched for [`CONFIG_FILENAME`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) if p.is_dir() => p.join(CONFIG_FILENAME),
            Some(p) => p.to_path_buf(),
            None => PathBuf::from(CONFIG_FILENAME),
        };

        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(&path))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["verbosity", "config", "simulate"]))
            .extract()
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

        tracing::debug!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Save the configuration to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// The built-in network catalog extended with `networks`.
    pub fn catalog(&self) -> Result<NetworkCatalog> {
        NetworkCatalog::with_overrides(self.networks.iter().map(|(name, id)| (name.clone(), *id)))
            .context("Invalid [networks] configuration")
    }

    pub fn timeouts(&self) -> SessionTimeouts {
        SessionTimeouts {
            quote: Duration::from_secs(self.quote_timeout_secs),
            submit: Duration::from_secs(self.submit_timeout_secs),
        }
    }

    pub fn artifacts(&self) -> FoundryArtifacts {
        FoundryArtifacts::new(&self.artifacts_dir)
    }

    /// Connection settings for the live adapter. Fails if a required key is missing.
    pub fn adapter_config(&self) -> Result<JsonRpcAdapterConfig> {
        let rpc_url = self
            .rpc_url
            .clone()
            .context("`rpc_url` is not configured")?;
        let adapter_address = self
            .adapter_address
            .context("`adapter_address` is not configured")?;
        let sender = self.sender.context("`sender` is not configured")?;

        // The receipt wait must end before the session's submit timeout fires, so the
        // adapter can still report the transaction hash.
        let submit = Duration::from_secs(self.submit_timeout_secs);
        let receipt_timeout = DEFAULT_RECEIPT_TIMEOUT.min(submit.saturating_sub(Duration::from_secs(5)));

        Ok(JsonRpcAdapterConfig {
            rpc_url,
            adapter_address,
            sender,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            receipt_timeout,
            receipt_poll_interval: Duration::from_millis(self.receipt_poll_interval_ms),
        })
    }

    pub fn live_adapter(&self) -> Result<JsonRpcAdapter> {
        JsonRpcAdapter::new(self.adapter_config()?)
    }
}
