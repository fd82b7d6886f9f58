//! Deployment session: stage targets, quote, pay, submit.
//!
//! A session moves through `Empty -> Staged -> Quoted -> Submitted`. A submission whose
//! outcome cannot be determined moves it to the terminal `Uncertain` state instead.
//! `Quoted` marks a payment in flight: a session left there by a cancelled `deploy`
//! stays closed.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use alloy_core::primitives::{B256, Bytes};
//! use fanout_deploy::{DeploySession, NetworkCatalog, SimulatedAdapter, StaticArtifacts};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let artifacts = StaticArtifacts::new().with("Counter.sol", vec![0x60, 0x80]);
//! let mut session = DeploySession::new(
//!     Arc::new(NetworkCatalog::default()),
//!     SimulatedAdapter::default(),
//!     artifacts,
//! );
//!
//! session.add_target("sepolia", Bytes::new(), Bytes::new())?;
//! session.add_target("mumbai", Bytes::new(), Bytes::new())?;
//!
//! let outcome = session
//!     .deploy("Counter.sol", 3_000_000, B256::repeat_byte(1), false)
//!     .await?;
//! println!("{}", outcome.receipt.tx_hash);
//! # Ok(())
//! # }
//! ```

use std::{sync::Arc, time::Duration};

use alloy_core::primitives::{Address, B256, Bytes, U256};
use serde::{Deserialize, Serialize};
use tokio::time::timeout;

use crate::{
    AdapterClient, ArtifactResolver, DeployReceipt, DeployRequest, DeploymentTargetSet,
    NetworkCatalog,
    catalog::DomainId,
    error::{AdapterError, DeployError},
};

/// Default bound on a fee quote round-trip.
pub const DEFAULT_QUOTE_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on a deploy submission, including waiting for the receipt.
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(180);

/// Lifecycle of a [`DeploySession`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum SessionState {
    /// No targets staged yet.
    Empty,
    /// At least one target staged; quoting and submitting are allowed.
    Staged,
    /// A fee quote was obtained and the payment-bearing submission started.
    Quoted,
    /// The adapter confirmed the deployment.
    Submitted,
    /// A payment-bearing submission ended with an unknown outcome.
    Uncertain,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Submitted | Self::Uncertain)
    }

    /// Whether targets may be added and a deployment started.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Empty | Self::Staged)
    }
}

/// Timeouts applied to each adapter round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimeouts {
    pub quote: Duration,
    pub submit: Duration,
}

impl Default for SessionTimeouts {
    fn default() -> Self {
        Self {
            quote: DEFAULT_QUOTE_TIMEOUT,
            submit: DEFAULT_SUBMIT_TIMEOUT,
        }
    }
}

/// Per-target fees returned by the adapter, index-aligned with the target set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeQuote(Vec<U256>);

impl FeeQuote {
    pub fn new(fees: Vec<U256>) -> Self {
        Self(fees)
    }

    /// Exact sum of all fees.
    pub fn total(&self) -> Result<U256, DeployError> {
        self.0.iter().try_fold(U256::ZERO, |acc, fee| {
            acc.checked_add(*fee).ok_or(DeployError::FeeOverflow)
        })
    }

    pub fn fees(&self) -> &[U256] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A priced deployment that has not been paid for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotedDeployment {
    pub domain_ids: Vec<DomainId>,
    pub fees: FeeQuote,
    pub total_fee: U256,
}

/// Result of a confirmed deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentOutcome {
    pub receipt: DeployReceipt,
    pub fees: FeeQuote,
    /// Exactly the value attached to the deploy call.
    pub total_fee: U256,
    pub salt: B256,
}

/// One logical multi-network deployment.
pub struct DeploySession<A, R> {
    targets: DeploymentTargetSet,
    adapter: A,
    artifacts: R,
    timeouts: SessionTimeouts,
    state: SessionState,
}

impl<A, R> DeploySession<A, R>
where
    A: AdapterClient,
    R: ArtifactResolver,
{
    pub fn new(catalog: Arc<NetworkCatalog>, adapter: A, artifacts: R) -> Self {
        Self {
            targets: DeploymentTargetSet::new(catalog),
            adapter,
            artifacts,
            timeouts: SessionTimeouts::default(),
            state: SessionState::Empty,
        }
    }

    pub fn with_timeouts(mut self, timeouts: SessionTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn targets(&self) -> &DeploymentTargetSet {
        &self.targets
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Stage one more network. Allowed until a submission has started.
    pub fn add_target(
        &mut self,
        network: &str,
        constructor_args: impl Into<Bytes>,
        init_data: impl Into<Bytes>,
    ) -> Result<DomainId, DeployError> {
        if !self.state.is_open() {
            return Err(DeployError::SessionClosed(self.state));
        }

        let domain_id = self
            .targets
            .add_target(network, constructor_args, init_data)?;

        if self.state == SessionState::Empty {
            self.state = SessionState::Staged;
        }

        Ok(domain_id)
    }

    /// Price the staged targets without paying.
    pub async fn quote(
        &self,
        contract: &str,
        gas_limit: u64,
        salt: B256,
        unique_per_chain: bool,
    ) -> Result<QuotedDeployment, DeployError> {
        self.ensure_open()?;
        let bytecode = self.load_bytecode(contract)?;
        let request = DeployRequest {
            bytecode: &bytecode,
            gas_limit,
            salt,
            unique_per_chain,
            targets: &self.targets,
        };

        let fees = self.fetch_quote(&request).await?;
        let total_fee = fees.total()?;

        Ok(QuotedDeployment {
            domain_ids: self.targets.domain_ids(),
            fees,
            total_fee,
        })
    }

    /// Quote every staged target and submit one deploy call paying the exact total.
    ///
    /// Definitive failures leave the session `Staged`; the call can be repeated and
    /// will fetch a fresh quote. An unknown submission outcome closes the session.
    pub async fn deploy(
        &mut self,
        contract: &str,
        gas_limit: u64,
        salt: B256,
        unique_per_chain: bool,
    ) -> Result<DeploymentOutcome, DeployError> {
        self.ensure_open()?;
        let bytecode = self.load_bytecode(contract)?;

        tracing::info!(
            contract,
            targets = self.targets.len(),
            gas_limit,
            salt = %salt,
            unique_per_chain,
            "Requesting deploy fee quote..."
        );

        let request = DeployRequest {
            bytecode: &bytecode,
            gas_limit,
            salt,
            unique_per_chain,
            targets: &self.targets,
        };
        let fees = self.fetch_quote(&request).await?;
        let total_fee = fees.total()?;

        self.state = SessionState::Quoted;

        tracing::info!(total_fee = %total_fee, "Submitting deployment...");

        let submission = timeout(
            self.timeouts.submit,
            self.adapter.submit_deploy(&request, fees.fees(), total_fee),
        )
        .await;

        let result = match submission {
            Ok(Ok(receipt)) => Ok(receipt),
            Ok(Err(AdapterError::Indeterminate { tx_hash, reason })) => {
                Err(DeployError::AmbiguousSubmission { tx_hash, reason })
            }
            Ok(Err(e)) => Err(DeployError::SubmissionFailed(e)),
            Err(_) => Err(DeployError::AmbiguousSubmission {
                tx_hash: None,
                reason: format!("no response within {:?}", self.timeouts.submit),
            }),
        };

        match result {
            Ok(receipt) => {
                self.state = SessionState::Submitted;
                tracing::info!(
                    tx_hash = %receipt.tx_hash,
                    block_number = ?receipt.block_number,
                    total_fee = %total_fee,
                    "Deployment submitted"
                );

                Ok(DeploymentOutcome {
                    receipt,
                    fees,
                    total_fee,
                    salt,
                })
            }
            Err(e @ DeployError::AmbiguousSubmission { .. }) => {
                self.state = SessionState::Uncertain;
                tracing::error!(error = %e, "Deployment outcome unknown, not retrying");
                Err(e)
            }
            Err(e) => {
                self.state = SessionState::Staged;
                tracing::warn!(error = %e, "Deployment submission rejected");
                Err(e)
            }
        }
    }

    /// Predict the deployment address through the adapter.
    pub async fn compute_address(
        &self,
        sender: Address,
        salt: B256,
        unique_per_chain: bool,
    ) -> Result<Address, DeployError> {
        self.adapter
            .compute_address(sender, salt, unique_per_chain)
            .await
            .map_err(DeployError::AddressQueryFailed)
    }

    fn ensure_open(&self) -> Result<(), DeployError> {
        if !self.state.is_open() {
            return Err(DeployError::SessionClosed(self.state));
        }
        if self.targets.is_empty() {
            return Err(DeployError::NoDeploymentTargets);
        }
        Ok(())
    }

    fn load_bytecode(&self, contract: &str) -> Result<Bytes, DeployError> {
        Ok(self.artifacts.get_code(contract)?)
    }

    async fn fetch_quote(&self, request: &DeployRequest<'_>) -> Result<FeeQuote, DeployError> {
        let fees = timeout(self.timeouts.quote, self.adapter.quote_fees(request))
            .await
            .map_err(|_| DeployError::QuoteTimedOut(self.timeouts.quote))?
            .map_err(DeployError::QuoteFailed)?;

        if fees.len() != self.targets.len() {
            return Err(DeployError::FeeQuoteMismatch {
                expected: self.targets.len(),
                got: fees.len(),
            });
        }

        for (target, fee) in self.targets.iter().zip(&fees) {
            tracing::debug!(network = %target.network, domain_id = %target.domain_id, fee = %fee, "Quoted target");
        }

        Ok(FeeQuote::new(fees))
    }
}
