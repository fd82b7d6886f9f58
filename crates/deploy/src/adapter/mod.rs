//! Boundary to the remote deploy-adapter service.
//!
//! [`AdapterClient`] is the capability interface the session depends on. Backends:
//! - [`JsonRpcAdapter`]: live adapter contract reached through an Ethereum node
//! - [`SimulatedAdapter`]: deterministic in-process backend for dry runs

pub mod interface;
mod rpc_client;
mod simulated;

use std::future::Future;

use alloy_core::primitives::{Address, B256, Bytes, U256};
use serde::{Deserialize, Serialize};

pub use rpc_client::{
    DEFAULT_RECEIPT_POLL_INTERVAL, DEFAULT_RECEIPT_TIMEOUT, JsonRpcAdapter, JsonRpcAdapterConfig,
};
pub use simulated::SimulatedAdapter;

use crate::{DeploymentTargetSet, error::AdapterError};

/// Everything the adapter needs to price or execute a deployment.
#[derive(Debug, Clone, Copy)]
pub struct DeployRequest<'a> {
    pub bytecode: &'a Bytes,
    /// Gas limit for the creation on each destination network.
    pub gas_limit: u64,
    pub salt: B256,
    pub unique_per_chain: bool,
    pub targets: &'a DeploymentTargetSet,
}

/// Confirmation returned once the adapter accepted a paid deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployReceipt {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
}

/// Remote operations of the deploy adapter.
///
/// `submit_deploy` moves funds and is not idempotent: a backend must report an
/// unknown outcome as [`AdapterError::Indeterminate`] instead of retrying.
pub trait AdapterClient: Send + Sync {
    /// Per-target fees, index-aligned with `request.targets`.
    fn quote_fees(
        &self,
        request: &DeployRequest<'_>,
    ) -> impl Future<Output = Result<Vec<U256>, AdapterError>> + Send;

    /// Pay `total_payment` and ask the adapter to deploy to every target.
    fn submit_deploy(
        &self,
        request: &DeployRequest<'_>,
        fees: &[U256],
        total_payment: U256,
    ) -> impl Future<Output = Result<DeployReceipt, AdapterError>> + Send;

    /// Address the contract will get for `sender` and `salt`.
    fn compute_address(
        &self,
        sender: Address,
        salt: B256,
        unique_per_chain: bool,
    ) -> impl Future<Output = Result<Address, AdapterError>> + Send;
}
