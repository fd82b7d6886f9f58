//! Ordered set of per-network deployment targets.

use std::sync::Arc;

use alloy_core::primitives::Bytes;

use crate::{
    catalog::{DomainId, NetworkCatalog},
    error::DeployError,
};

/// One leg of a multi-network deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentTarget {
    /// The network name the domain id was resolved from.
    pub network: String,
    pub domain_id: DomainId,
    /// ABI-encoded constructor arguments for this network.
    pub constructor_args: Bytes,
    /// Calldata invoked on the contract right after it is created.
    pub init_data: Bytes,
}

/// The wire view of a target set: three index-aligned sequences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSnapshot {
    pub domain_ids: Vec<u32>,
    pub constructor_args: Vec<Bytes>,
    pub init_data: Vec<Bytes>,
}

impl TargetSnapshot {
    pub fn len(&self) -> usize {
        self.domain_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domain_ids.is_empty()
    }
}

/// Append-only, ordered collection of [`DeploymentTarget`]s.
///
/// Insertion order is the order in which fees are quoted and in which the adapter
/// processes targets.
#[derive(Debug, Clone)]
pub struct DeploymentTargetSet {
    catalog: Arc<NetworkCatalog>,
    targets: Vec<DeploymentTarget>,
}

impl DeploymentTargetSet {
    pub fn new(catalog: Arc<NetworkCatalog>) -> Self {
        Self {
            catalog,
            targets: Vec::new(),
        }
    }

    /// Resolve `network` and append a target for it.
    ///
    /// On failure the set is left untouched.
    pub fn add_target(
        &mut self,
        network: &str,
        constructor_args: impl Into<Bytes>,
        init_data: impl Into<Bytes>,
    ) -> Result<DomainId, DeployError> {
        let domain_id = self.catalog.resolve(network)?;

        self.targets.push(DeploymentTarget {
            network: network.to_string(),
            domain_id,
            constructor_args: constructor_args.into(),
            init_data: init_data.into(),
        });

        tracing::debug!(
            network,
            domain_id = %domain_id,
            position = self.targets.len() - 1,
            "Deployment target added"
        );

        Ok(domain_id)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeploymentTarget> {
        self.targets.iter()
    }

    pub fn domain_ids(&self) -> Vec<DomainId> {
        self.targets.iter().map(|t| t.domain_id).collect()
    }

    /// Split the targets into the three aligned sequences the adapter expects.
    pub fn snapshot(&self) -> TargetSnapshot {
        let mut snapshot = TargetSnapshot {
            domain_ids: Vec::with_capacity(self.targets.len()),
            constructor_args: Vec::with_capacity(self.targets.len()),
            init_data: Vec::with_capacity(self.targets.len()),
        };

        for target in &self.targets {
            snapshot.domain_ids.push(target.domain_id.get());
            snapshot.constructor_args.push(target.constructor_args.clone());
            snapshot.init_data.push(target.init_data.clone());
        }

        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogError;

    fn test_catalog() -> Arc<NetworkCatalog> {
        Arc::new(NetworkCatalog::from_entries([("sepolia", 2), ("mumbai", 7)]).unwrap())
    }

    #[test]
    fn test_add_targets_preserves_order() {
        let mut set = DeploymentTargetSet::new(test_catalog());

        set.add_target("sepolia", Bytes::from_static(b"args_a"), Bytes::from_static(b"init_a"))
            .unwrap();
        set.add_target("mumbai", Bytes::from_static(b"args_b"), Bytes::from_static(b"init_b"))
            .unwrap();

        assert_eq!(set.len(), 2);

        let snapshot = set.snapshot();
        assert_eq!(snapshot.domain_ids, vec![2, 7]);
        assert_eq!(
            snapshot.constructor_args,
            vec![Bytes::from_static(b"args_a"), Bytes::from_static(b"args_b")]
        );
        assert_eq!(
            snapshot.init_data,
            vec![Bytes::from_static(b"init_a"), Bytes::from_static(b"init_b")]
        );
    }

    #[test]
    fn test_unknown_network_leaves_set_unchanged() {
        let mut set = DeploymentTargetSet::new(test_catalog());

        let err = set
            .add_target("polygon", Bytes::new(), Bytes::new())
            .unwrap_err();

        assert!(matches!(
            err,
            DeployError::InvalidDeploymentTarget(CatalogError::UnknownNetwork(ref name)) if name == "polygon"
        ));
        assert_eq!(set.len(), 0);
        assert!(set.is_empty());
    }

    #[test]
    fn test_snapshot_stays_aligned_across_mixed_calls() {
        let mut set = DeploymentTargetSet::new(test_catalog());
        let names = ["sepolia", "polygon", "mumbai", "", "mumbai", "sepolia", "base"];

        let mut accepted = 0;
        for (i, name) in names.iter().enumerate() {
            let before = set.len();
            match set.add_target(name, vec![i as u8], vec![i as u8; i]) {
                Ok(_) => accepted += 1,
                Err(_) => assert_eq!(set.len(), before),
            }

            let snapshot = set.snapshot();
            assert_eq!(set.len(), accepted);
            assert_eq!(snapshot.len(), accepted);
            assert_eq!(snapshot.constructor_args.len(), accepted);
            assert_eq!(snapshot.init_data.len(), accepted);
        }

        assert_eq!(set.snapshot().domain_ids, vec![2, 7, 7, 2]);
    }

    #[test]
    fn test_snapshot_does_not_consume_targets() {
        let mut set = DeploymentTargetSet::new(test_catalog());
        set.add_target("sepolia", Bytes::new(), Bytes::new()).unwrap();

        let first = set.snapshot();
        let second = set.snapshot();

        assert_eq!(first, second);
        assert_eq!(set.len(), 1);
    }
}
