//! Error types for deployment sessions.

use std::time::Duration;

use alloy_core::primitives::B256;

use crate::{artifacts::ArtifactError, catalog::CatalogError, session::SessionState};

/// Failure reported by an [`AdapterClient`](crate::AdapterClient) backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    /// The request never reached the adapter service.
    #[error("transport error: {0}")]
    Transport(String),
    /// The adapter or the node refused the call, or the transaction reverted.
    #[error("adapter rejected the call: {0}")]
    Rejected(String),
    #[error("malformed adapter response: {0}")]
    Decode(String),
    /// A payment-bearing call whose remote outcome is unknown.
    #[error("outcome unknown{}: {reason}", .tx_hash.as_ref().map(|h| format!(" for transaction {h}")).unwrap_or_default())]
    Indeterminate {
        tx_hash: Option<B256>,
        reason: String,
    },
}

/// Errors returned by a [`DeploySession`](crate::DeploySession).
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("invalid deployment target: {0}")]
    InvalidDeploymentTarget(#[from] CatalogError),
    #[error("no deployment targets staged")]
    NoDeploymentTargets,
    #[error(transparent)]
    BytecodeNotFound(#[from] ArtifactError),
    #[error("fee quote failed: {0}")]
    QuoteFailed(#[source] AdapterError),
    #[error("fee quote timed out after {0:?}")]
    QuoteTimedOut(Duration),
    #[error("fee quote has {got} entries for {expected} targets")]
    FeeQuoteMismatch { expected: usize, got: usize },
    #[error("total fee overflows 256 bits")]
    FeeOverflow,
    #[error("deploy submission failed: {0}")]
    SubmissionFailed(#[source] AdapterError),
    /// The deploy call may or may not have been executed. Retrying could pay twice.
    #[error("deploy submission outcome unknown{}: {reason}", .tx_hash.as_ref().map(|h| format!(" (transaction {h})")).unwrap_or_default())]
    AmbiguousSubmission {
        tx_hash: Option<B256>,
        reason: String,
    },
    #[error("address query failed: {0}")]
    AddressQueryFailed(#[source] AdapterError),
    #[error("session is closed (state: {0})")]
    SessionClosed(SessionState),
}

impl DeployError {
    /// Whether the same call may be issued again without risking a double payment.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::QuoteFailed(_)
                | Self::QuoteTimedOut(_)
                | Self::FeeQuoteMismatch { .. }
                | Self::SubmissionFailed(_)
                | Self::AddressQueryFailed(_)
        )
    }
}
