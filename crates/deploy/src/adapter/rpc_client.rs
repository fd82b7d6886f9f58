//! Live adapter backend over Ethereum JSON-RPC.

use std::time::Duration;

use alloy_core::{
    primitives::{Address, B256, Bytes, U64, U256},
    sol_types::SolCall,
};
use anyhow::Context;
use serde::Deserialize;
use url::Url;

use super::{
    AdapterClient, DeployReceipt, DeployRequest,
    interface::{IDeployAdapter, calldata},
};
use crate::{error::AdapterError, rpc};

/// Default time to wait for a deploy transaction to be mined.
pub const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default interval between receipt polls.
pub const DEFAULT_RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Connection settings for [`JsonRpcAdapter`].
#[derive(Debug, Clone)]
pub struct JsonRpcAdapterConfig {
    pub rpc_url: Url,
    /// Address of the adapter contract. Identical on every supported network.
    pub adapter_address: Address,
    /// Node-managed account that signs and pays for the deploy transaction.
    pub sender: Address,
    pub request_timeout: Duration,
    pub receipt_timeout: Duration,
    pub receipt_poll_interval: Duration,
}

/// Adapter reached through `eth_call` / `eth_sendTransaction` on a node.
#[derive(Debug, Clone)]
pub struct JsonRpcAdapter {
    client: reqwest::Client,
    config: JsonRpcAdapterConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionReceipt {
    transaction_hash: B256,
    block_number: Option<U64>,
    status: Option<U64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockEntropy {
    mix_hash: Option<B256>,
    hash: Option<B256>,
}

impl JsonRpcAdapter {
    pub fn new(config: JsonRpcAdapterConfig) -> Result<Self, anyhow::Error> {
        let client = rpc::create_client(config.request_timeout)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &JsonRpcAdapterConfig {
        &self.config
    }

    async fn eth_call<C: SolCall>(&self, call: &C) -> Result<C::Return, AdapterError> {
        let output: Bytes = rpc::json_rpc_call(
            &self.client,
            self.config.rpc_url.as_str(),
            "eth_call",
            vec![
                serde_json::json!({
                    "from": self.config.sender,
                    "to": self.config.adapter_address,
                    "data": calldata(call),
                }),
                serde_json::json!("latest"),
            ],
        )
        .await
        .map_err(classify_query_error)?;

        C::abi_decode_returns(&output, true).map_err(|e| {
            AdapterError::Decode(format!("{} returned undecodable data: {e}", C::SIGNATURE))
        })
    }

    /// `prevrandao` of the latest block, or its hash on chains without one.
    pub async fn latest_block_entropy(&self) -> Result<B256, anyhow::Error> {
        let block: BlockEntropy = rpc::json_rpc_call(
            &self.client,
            self.config.rpc_url.as_str(),
            "eth_getBlockByNumber",
            vec![serde_json::json!("latest"), serde_json::json!(false)],
        )
        .await
        .context("Failed to fetch latest block")?;

        block
            .mix_hash
            .filter(|h| !h.is_zero())
            .or(block.hash)
            .context("Latest block carries no entropy")
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TransactionReceipt, anyhow::Error> {
        rpc::poll_until(
            "deploy transaction receipt",
            self.config.receipt_timeout,
            self.config.receipt_poll_interval,
            || async move {
                rpc::json_rpc_call::<Option<TransactionReceipt>>(
                    &self.client,
                    self.config.rpc_url.as_str(),
                    "eth_getTransactionReceipt",
                    vec![serde_json::json!(tx_hash)],
                )
                .await
            },
        )
        .await
    }
}

impl AdapterClient for JsonRpcAdapter {
    async fn quote_fees(&self, request: &DeployRequest<'_>) -> Result<Vec<U256>, AdapterError> {
        let call = IDeployAdapter::quoteDeployFeesCall::from(request);
        let fees = self.eth_call(&call).await?.fees;

        tracing::debug!(targets = request.targets.len(), fees = ?fees, "Received fee quote");

        Ok(fees)
    }

    async fn submit_deploy(
        &self,
        request: &DeployRequest<'_>,
        fees: &[U256],
        total_payment: U256,
    ) -> Result<DeployReceipt, AdapterError> {
        let call = IDeployAdapter::deployToChainsCall::new(request, fees);

        let tx_hash: B256 = rpc::json_rpc_call(
            &self.client,
            self.config.rpc_url.as_str(),
            "eth_sendTransaction",
            vec![serde_json::json!({
                "from": self.config.sender,
                "to": self.config.adapter_address,
                "value": total_payment,
                "data": calldata(&call),
            })],
        )
        .await
        .map_err(classify_send_error)?;

        tracing::info!(tx_hash = %tx_hash, value = %total_payment, "Deploy transaction sent");

        let receipt = self
            .wait_for_receipt(tx_hash)
            .await
            .map_err(|e| AdapterError::Indeterminate {
                tx_hash: Some(tx_hash),
                reason: format!("{e:#}"),
            })?;

        receipt_outcome(receipt)
    }

    async fn compute_address(
        &self,
        sender: Address,
        salt: B256,
        unique_per_chain: bool,
    ) -> Result<Address, AdapterError> {
        let call = IDeployAdapter::computeContractAddressForChainCall {
            sender,
            salt,
            isUniquePerChain: unique_per_chain,
        };

        Ok(self.eth_call(&call).await?._0)
    }
}

/// Read-only calls move no funds, so every failure is definitive.
fn classify_query_error(err: anyhow::Error) -> AdapterError {
    if let Some(rpc_err) = rpc::rpc_error(&err) {
        AdapterError::Rejected(rpc_err.to_string())
    } else if rpc::is_connect_error(&err) || rpc::is_timeout_error(&err) {
        AdapterError::Transport(format!("{err:#}"))
    } else {
        AdapterError::Decode(format!("{err:#}"))
    }
}

/// Classify a failed `eth_sendTransaction`.
///
/// Only an explicit node error or a refused connection proves the transaction was
/// not accepted. Anything else may have reached the mempool.
fn classify_send_error(err: anyhow::Error) -> AdapterError {
    if let Some(rpc_err) = rpc::rpc_error(&err) {
        AdapterError::Rejected(rpc_err.to_string())
    } else if rpc::is_connect_error(&err) {
        AdapterError::Transport(format!("{err:#}"))
    } else {
        AdapterError::Indeterminate {
            tx_hash: None,
            reason: format!("{err:#}"),
        }
    }
}

fn receipt_outcome(receipt: TransactionReceipt) -> Result<DeployReceipt, AdapterError> {
    // Pre-Byzantium receipts carry no status; treat them as successful.
    if receipt.status == Some(U64::ZERO) {
        return Err(AdapterError::Rejected(format!(
            "deploy transaction {} reverted",
            receipt.transaction_hash
        )));
    }

    Ok(DeployReceipt {
        tx_hash: receipt.transaction_hash,
        block_number: receipt.block_number.map(|n| n.to::<u64>()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::RpcErrorResponse;

    fn receipt(status: Option<u64>) -> TransactionReceipt {
        serde_json::from_value(serde_json::json!({
            "transactionHash": B256::repeat_byte(0x01),
            "blockNumber": "0x10",
            "status": status.map(|s| format!("{:#x}", s)),
            "gasUsed": "0x5208",
        }))
        .expect("Receipt should deserialize")
    }

    #[test]
    fn test_successful_receipt() {
        let outcome = receipt_outcome(receipt(Some(1))).unwrap();

        assert_eq!(outcome.tx_hash, B256::repeat_byte(0x01));
        assert_eq!(outcome.block_number, Some(16));
    }

    #[test]
    fn test_reverted_receipt_is_rejected() {
        assert!(matches!(
            receipt_outcome(receipt(Some(0))),
            Err(AdapterError::Rejected(_))
        ));
    }

    #[test]
    fn test_receipt_without_status() {
        assert!(receipt_outcome(receipt(None)).is_ok());
    }

    #[test]
    fn test_node_error_on_send_is_definitive() {
        let err = anyhow::Error::new(RpcErrorResponse {
            code: -32000,
            message: "insufficient funds for gas * price + value".to_string(),
        })
        .context("eth_sendTransaction failed");

        assert!(matches!(classify_send_error(err), AdapterError::Rejected(_)));
    }

    #[test]
    fn test_unclassified_send_error_is_indeterminate() {
        let err = anyhow::anyhow!("Failed to parse eth_sendTransaction response");

        assert!(matches!(
            classify_send_error(err),
            AdapterError::Indeterminate { tx_hash: None, .. }
        ));
    }

    #[test]
    fn test_query_errors_are_never_indeterminate() {
        let err = anyhow::anyhow!("Failed to parse eth_call response");
        assert!(matches!(classify_query_error(err), AdapterError::Decode(_)));
    }

    #[tokio::test]
    async fn test_silent_node_is_a_transport_error() {
        // Accepts connections but never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                open.push(stream);
            }
        });

        let adapter = JsonRpcAdapter::new(JsonRpcAdapterConfig {
            rpc_url: Url::parse(&format!("http://{addr}/")).unwrap(),
            adapter_address: Address::ZERO,
            sender: Address::ZERO,
            request_timeout: Duration::from_millis(100),
            receipt_timeout: Duration::from_secs(1),
            receipt_poll_interval: Duration::from_millis(100),
        })
        .unwrap();

        let targets = crate::DeploymentTargetSet::new(std::sync::Arc::new(
            crate::NetworkCatalog::default(),
        ));
        let bytecode = Bytes::from_static(&[0x60]);
        let request = DeployRequest {
            bytecode: &bytecode,
            gas_limit: 1,
            salt: B256::ZERO,
            unique_per_chain: false,
            targets: &targets,
        };

        let err = adapter.quote_fees(&request).await.unwrap_err();

        assert!(matches!(err, AdapterError::Transport(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_unreachable_node_is_a_transport_error() {
        let adapter = JsonRpcAdapter::new(JsonRpcAdapterConfig {
            // Port 9 (discard) on localhost is closed in test environments.
            rpc_url: Url::parse("http://127.0.0.1:9/").unwrap(),
            adapter_address: Address::ZERO,
            sender: Address::ZERO,
            request_timeout: Duration::from_secs(2),
            receipt_timeout: Duration::from_secs(1),
            receipt_poll_interval: Duration::from_millis(100),
        })
        .unwrap();

        let err = adapter
            .compute_address(Address::ZERO, B256::ZERO, false)
            .await
            .unwrap_err();

        assert!(matches!(err, AdapterError::Transport(_)));
    }
}
