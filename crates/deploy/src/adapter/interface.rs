//! ABI of the on-chain deploy adapter.

use alloy_core::{
    primitives::{Bytes, U256},
    sol,
};

use super::DeployRequest;

sol! {
    /// Chain-agnostic adapter that fans a single deployment out to several networks.
    #[derive(Debug, PartialEq, Eq)]
    interface IDeployAdapter {
        function quoteDeployFees(
            bytes bytecode,
            uint256 gasLimit,
            bytes32 salt,
            bool isUniquePerChain,
            uint32[] domainIds,
            bytes[] constructorArgs,
            bytes[] initData
        ) external view returns (uint256[] fees);

        function deployToChains(
            bytes bytecode,
            uint256 gasLimit,
            bytes32 salt,
            bool isUniquePerChain,
            uint32[] domainIds,
            bytes[] constructorArgs,
            bytes[] initData,
            uint256[] fees
        ) external payable;

        function computeContractAddressForChain(
            address sender,
            bytes32 salt,
            bool isUniquePerChain
        ) external view returns (address);
    }
}

impl From<&DeployRequest<'_>> for IDeployAdapter::quoteDeployFeesCall {
    fn from(request: &DeployRequest<'_>) -> Self {
        let targets = request.targets.snapshot();
        Self {
            bytecode: request.bytecode.clone(),
            gasLimit: U256::from(request.gas_limit),
            salt: request.salt,
            isUniquePerChain: request.unique_per_chain,
            domainIds: targets.domain_ids,
            constructorArgs: targets.constructor_args,
            initData: targets.init_data,
        }
    }
}

impl IDeployAdapter::deployToChainsCall {
    /// Build the payable deploy call for `request`, carrying the per-target `fees`.
    pub fn new(request: &DeployRequest<'_>, fees: &[U256]) -> Self {
        let targets = request.targets.snapshot();
        Self {
            bytecode: request.bytecode.clone(),
            gasLimit: U256::from(request.gas_limit),
            salt: request.salt,
            isUniquePerChain: request.unique_per_chain,
            domainIds: targets.domain_ids,
            constructorArgs: targets.constructor_args,
            initData: targets.init_data,
            fees: fees.to_vec(),
        }
    }
}

/// Calldata as a `Bytes` value ready for a JSON-RPC request.
pub fn calldata<C: alloy_core::sol_types::SolCall>(call: &C) -> Bytes {
    Bytes::from(call.abi_encode())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use alloy_core::{primitives::B256, sol_types::SolCall};

    use super::*;
    use crate::{DeploymentTargetSet, NetworkCatalog};

    #[test]
    fn test_quote_call_carries_aligned_targets() {
        let mut targets = DeploymentTargetSet::new(Arc::new(NetworkCatalog::default()));
        targets.add_target("sepolia", vec![0x01], vec![0xaa]).unwrap();
        targets.add_target("mumbai", vec![0x02], Bytes::new()).unwrap();

        let bytecode = Bytes::from_static(&[0x60, 0x80]);
        let request = DeployRequest {
            bytecode: &bytecode,
            gas_limit: 3_000_000,
            salt: B256::repeat_byte(0x11),
            unique_per_chain: true,
            targets: &targets,
        };

        let call = IDeployAdapter::quoteDeployFeesCall::from(&request);
        assert_eq!(call.domainIds, vec![2, 7]);
        assert_eq!(call.constructorArgs.len(), 2);
        assert_eq!(call.initData.len(), 2);
        assert_eq!(call.gasLimit, U256::from(3_000_000u64));

        let encoded = calldata(&call);
        assert_eq!(&encoded[..4], IDeployAdapter::quoteDeployFeesCall::SELECTOR.as_slice());
    }

    #[test]
    fn test_deploy_call_carries_fees() {
        let mut targets = DeploymentTargetSet::new(Arc::new(NetworkCatalog::default()));
        targets.add_target("holesky", Bytes::new(), Bytes::new()).unwrap();

        let bytecode = Bytes::from_static(&[0x60, 0x80]);
        let request = DeployRequest {
            bytecode: &bytecode,
            gas_limit: 1,
            salt: B256::ZERO,
            unique_per_chain: false,
            targets: &targets,
        };

        let call = IDeployAdapter::deployToChainsCall::new(&request, &[U256::from(42u64)]);
        assert_eq!(call.domainIds, vec![6]);
        assert_eq!(call.fees, vec![U256::from(42u64)]);
    }
}
