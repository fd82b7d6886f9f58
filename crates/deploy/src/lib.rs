//! fanout-deploy - Multi-network contract deployment through a deploy adapter.
//!
//! This crate collects the networks a contract should be deployed to, prices the
//! deployment with the adapter, attaches the exact total fee and submits a single
//! deployment request that the adapter relays to every destination network.

pub mod adapter;
mod artifacts;
mod catalog;
mod config;
mod error;
mod plan;
pub mod rpc;
mod salt;
mod session;
mod targets;

pub use adapter::{
    AdapterClient, DeployReceipt, DeployRequest, JsonRpcAdapter, JsonRpcAdapterConfig,
    SimulatedAdapter,
};
pub use artifacts::{ArtifactError, ArtifactResolver, FoundryArtifacts, StaticArtifacts};
pub use catalog::{CatalogError, DEFAULT_NETWORKS, DomainId, NetworkCatalog};
pub use config::{CONFIG_FILENAME, FanoutConfig};
pub use error::{AdapterError, DeployError};
pub use plan::{DEFAULT_GAS_LIMIT, DeploymentPlan, PlannedTarget};
pub use salt::SaltGenerator;
pub use session::{
    DEFAULT_QUOTE_TIMEOUT, DEFAULT_SUBMIT_TIMEOUT, DeploySession, DeploymentOutcome, FeeQuote,
    QuotedDeployment, SessionState, SessionTimeouts,
};
pub use targets::{DeploymentTarget, DeploymentTargetSet, TargetSnapshot};
