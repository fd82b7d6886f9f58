//! Deterministic in-process adapter used for dry runs.

use alloy_core::primitives::{Address, B256, U256, keccak256};

use super::{
    AdapterClient, DeployReceipt, DeployRequest,
    interface::{IDeployAdapter, calldata},
};
use crate::error::AdapterError;

/// Default flat fee per unit of domain id, in wei.
pub const DEFAULT_BASE_FEE: u64 = 1_000_000_000_000;
/// Default fee per payload byte, in wei.
pub const DEFAULT_BYTE_FEE: u64 = 16_000_000;

/// Adapter that prices and "executes" deployments locally.
///
/// `fee = base_fee * domain_id + byte_fee * (bytecode + constructor args + init data)`.
/// Submissions are checked against this schedule like the on-chain adapter would.
#[derive(Debug, Clone)]
pub struct SimulatedAdapter {
    base_fee: U256,
    byte_fee: U256,
    /// Chain the simulated sender deploys from.
    origin_chain_id: u64,
}

impl Default for SimulatedAdapter {
    fn default() -> Self {
        Self::new(U256::from(DEFAULT_BASE_FEE), U256::from(DEFAULT_BYTE_FEE), 1)
    }
}

impl SimulatedAdapter {
    pub fn new(base_fee: U256, byte_fee: U256, origin_chain_id: u64) -> Self {
        Self {
            base_fee,
            byte_fee,
            origin_chain_id,
        }
    }

    fn fees(&self, request: &DeployRequest<'_>) -> Vec<U256> {
        request
            .targets
            .iter()
            .map(|target| {
                let payload = request.bytecode.len()
                    + target.constructor_args.len()
                    + target.init_data.len();
                self.base_fee
                    .saturating_mul(U256::from(target.domain_id.get()))
                    .saturating_add(self.byte_fee.saturating_mul(U256::from(payload)))
            })
            .collect()
    }
}

impl AdapterClient for SimulatedAdapter {
    async fn quote_fees(&self, request: &DeployRequest<'_>) -> Result<Vec<U256>, AdapterError> {
        Ok(self.fees(request))
    }

    async fn submit_deploy(
        &self,
        request: &DeployRequest<'_>,
        fees: &[U256],
        total_payment: U256,
    ) -> Result<DeployReceipt, AdapterError> {
        let expected = self.fees(request);
        if fees.len() != expected.len() {
            return Err(AdapterError::Rejected(format!(
                "expected {} fees, got {}",
                expected.len(),
                fees.len()
            )));
        }

        let required = expected
            .iter()
            .fold(U256::ZERO, |acc, fee| acc.saturating_add(*fee));
        if total_payment < required {
            return Err(AdapterError::Rejected(format!(
                "insufficient payment: sent {total_payment}, required {required}"
            )));
        }

        let call = IDeployAdapter::deployToChainsCall::new(request, fees);
        let tx_hash = keccak256(calldata(&call));

        tracing::info!(tx_hash = %tx_hash, value = %total_payment, "Simulated deploy accepted");

        Ok(DeployReceipt {
            tx_hash,
            block_number: None,
        })
    }

    async fn compute_address(
        &self,
        sender: Address,
        salt: B256,
        unique_per_chain: bool,
    ) -> Result<Address, AdapterError> {
        let mut preimage = Vec::with_capacity(20 + 32 + 1 + 8);
        preimage.extend_from_slice(sender.as_slice());
        preimage.extend_from_slice(salt.as_slice());
        preimage.push(unique_per_chain as u8);
        if unique_per_chain {
            preimage.extend_from_slice(&self.origin_chain_id.to_be_bytes());
        }

        Ok(Address::from_word(keccak256(preimage)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use alloy_core::primitives::Bytes;

    use super::*;
    use crate::{DeploymentTargetSet, NetworkCatalog};

    fn targets() -> DeploymentTargetSet {
        let mut targets = DeploymentTargetSet::new(Arc::new(NetworkCatalog::default()));
        targets.add_target("sepolia", vec![0u8; 4], Bytes::new()).unwrap();
        targets.add_target("mumbai", Bytes::new(), vec![0u8; 2]).unwrap();
        targets
    }

    #[tokio::test]
    async fn test_fee_schedule() {
        let adapter = SimulatedAdapter::new(U256::from(100u64), U256::from(1u64), 1);
        let targets = targets();
        let bytecode = Bytes::from_static(&[0u8; 10]);
        let request = DeployRequest {
            bytecode: &bytecode,
            gas_limit: 1_000_000,
            salt: B256::ZERO,
            unique_per_chain: false,
            targets: &targets,
        };

        let fees = adapter.quote_fees(&request).await.unwrap();

        // sepolia: 100 * 2 + 14 bytes, mumbai: 100 * 7 + 12 bytes
        assert_eq!(fees, vec![U256::from(214u64), U256::from(712u64)]);
    }

    #[tokio::test]
    async fn test_underpayment_is_rejected() {
        let adapter = SimulatedAdapter::new(U256::from(100u64), U256::ZERO, 1);
        let targets = targets();
        let bytecode = Bytes::from_static(&[0x60]);
        let request = DeployRequest {
            bytecode: &bytecode,
            gas_limit: 1,
            salt: B256::ZERO,
            unique_per_chain: false,
            targets: &targets,
        };
        let fees = adapter.quote_fees(&request).await.unwrap();

        let err = adapter
            .submit_deploy(&request, &fees, U256::from(899u64))
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Rejected(_)));

        let receipt = adapter
            .submit_deploy(&request, &fees, U256::from(900u64))
            .await
            .unwrap();
        assert!(!receipt.tx_hash.is_zero());
    }

    #[tokio::test]
    async fn test_address_depends_on_uniqueness_flag() {
        let adapter = SimulatedAdapter::default();
        let sender = Address::repeat_byte(0x42);
        let salt = B256::repeat_byte(0x07);

        let shared = adapter.compute_address(sender, salt, false).await.unwrap();
        let unique = adapter.compute_address(sender, salt, true).await.unwrap();

        assert_ne!(shared, unique);
        assert_eq!(shared, adapter.compute_address(sender, salt, false).await.unwrap());
    }
}
