//! Static catalog of target networks known to the deploy adapter.

use std::{collections::BTreeMap, num::NonZeroU32};

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Networks registered with the deploy adapter, as `(name, domain id)` pairs.
pub const DEFAULT_NETWORKS: &[(&str, u32)] = &[
    ("goerli", 1),
    ("sepolia", 2),
    ("cronos-testnet", 5),
    ("holesky", 6),
    ("mumbai", 7),
    ("arbitrum-sepolia", 8),
    ("gnosis-chaido", 9),
];

/// Identifier the adapter ecosystem assigns to a network.
///
/// Zero is reserved as "unresolved", so it cannot be represented.
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DomainId(NonZeroU32);

impl DomainId {
    /// Returns `None` for the reserved value `0`.
    pub const fn new(id: u32) -> Option<Self> {
        match NonZeroU32::new(id) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

/// Errors raised while building or querying a [`NetworkCatalog`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("unknown network `{0}`")]
    UnknownNetwork(String),
    #[error("network `{0}` is mapped to the reserved domain id 0")]
    ReservedDomain(String),
    #[error("network `{name}` registered with conflicting domain ids {existing} and {conflicting}")]
    ConflictingDomain {
        name: String,
        existing: DomainId,
        conflicting: u32,
    },
}

/// Immutable mapping from network name to [`DomainId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkCatalog {
    networks: BTreeMap<String, DomainId>,
}

impl NetworkCatalog {
    /// Build a catalog from `(name, id)` pairs.
    ///
    /// Registering a name twice with the same id is accepted. Registering it with a
    /// different id, or with id `0`, is rejected.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let mut catalog = Self {
            networks: BTreeMap::new(),
        };
        catalog.extend(entries)?;
        Ok(catalog)
    }

    /// The built-in catalog extended with extra entries (usually from configuration).
    pub fn with_overrides<I, S>(extra: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let mut catalog = Self::default();
        catalog.extend(extra)?;
        Ok(catalog)
    }

    fn extend<I, S>(&mut self, entries: I) -> Result<(), CatalogError>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        for (name, id) in entries {
            let name = name.into();
            let domain = DomainId::new(id).ok_or_else(|| CatalogError::ReservedDomain(name.clone()))?;

            match self.networks.get(&name) {
                Some(existing) if *existing == domain => {
                    tracing::debug!(network = %name, domain = %domain, "Ignoring duplicate network registration");
                }
                Some(existing) => {
                    return Err(CatalogError::ConflictingDomain {
                        name,
                        existing: *existing,
                        conflicting: id,
                    });
                }
                None => {
                    self.networks.insert(name, domain);
                }
            }
        }

        Ok(())
    }

    /// Resolve a network name to its domain id.
    pub fn resolve(&self, name: &str) -> Result<DomainId, CatalogError> {
        self.networks
            .get(name)
            .copied()
            .ok_or_else(|| CatalogError::UnknownNetwork(name.to_string()))
    }

    /// All registered networks, ordered by domain id.
    pub fn entries(&self) -> Vec<(&str, DomainId)> {
        let mut entries: Vec<_> = self
            .networks
            .iter()
            .map(|(name, id)| (name.as_str(), *id))
            .collect();
        entries.sort_by_key(|(name, id)| (*id, *name));
        entries
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}

impl Default for NetworkCatalog {
    fn default() -> Self {
        let networks = DEFAULT_NETWORKS
            .iter()
            .filter_map(|(name, id)| DomainId::new(*id).map(|id| (name.to_string(), id)))
            .collect();
        Self { networks }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_resolves_known_networks() {
        let catalog = NetworkCatalog::default();

        assert_eq!(catalog.resolve("goerli").unwrap().get(), 1);
        assert_eq!(catalog.resolve("sepolia").unwrap().get(), 2);
        assert_eq!(catalog.resolve("cronos-testnet").unwrap().get(), 5);
        assert_eq!(catalog.resolve("holesky").unwrap().get(), 6);
        assert_eq!(catalog.resolve("mumbai").unwrap().get(), 7);
        assert_eq!(catalog.resolve("arbitrum-sepolia").unwrap().get(), 8);
        assert_eq!(catalog.resolve("gnosis-chaido").unwrap().get(), 9);
        assert_eq!(catalog.len(), DEFAULT_NETWORKS.len());
    }

    #[test]
    fn test_unknown_network() {
        let catalog = NetworkCatalog::default();
        assert_eq!(
            catalog.resolve("polygon"),
            Err(CatalogError::UnknownNetwork("polygon".to_string()))
        );
    }

    #[test]
    fn test_duplicate_with_same_id_is_tolerated() {
        let catalog =
            NetworkCatalog::from_entries([("holesky", 6), ("sepolia", 2), ("holesky", 6)]).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.resolve("holesky").unwrap().get(), 6);
    }

    #[test]
    fn test_duplicate_with_conflicting_id_is_rejected() {
        let err = NetworkCatalog::from_entries([("holesky", 6), ("holesky", 17000)]).unwrap_err();

        assert!(matches!(
            err,
            CatalogError::ConflictingDomain { ref name, conflicting: 17000, .. } if name == "holesky"
        ));
    }

    #[test]
    fn test_reserved_domain_is_rejected() {
        assert_eq!(
            NetworkCatalog::from_entries([("void", 0)]),
            Err(CatalogError::ReservedDomain("void".to_string()))
        );
    }

    #[test]
    fn test_overrides_extend_builtin_table() {
        let catalog = NetworkCatalog::with_overrides([("base-sepolia", 12)]).unwrap();

        assert_eq!(catalog.resolve("base-sepolia").unwrap().get(), 12);
        assert_eq!(catalog.resolve("sepolia").unwrap().get(), 2);

        assert!(NetworkCatalog::with_overrides([("sepolia", 3)]).is_err());
    }

    #[test]
    fn test_entries_are_ordered_by_domain() {
        let catalog = NetworkCatalog::default();
        let ids: Vec<u32> = catalog.entries().iter().map(|(_, id)| id.get()).collect();

        assert_eq!(ids, vec![1, 2, 5, 6, 7, 8, 9]);
    }
}
