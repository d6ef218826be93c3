//! Blockchain network identification and registry.
//!
//! x402 v1 names networks by human-readable strings (`"base"`,
//! `"base-sepolia"`). This module maps those names to numeric chain IDs and
//! block explorers. Concrete network data lives in `relay402-evm`
//! (`EVM_NETWORKS`); applications assemble a [`NetworkRegistry`] from it at
//! startup.

use std::borrow::Cow;
use std::collections::HashMap;

/// A known network definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInfo {
    /// Human-readable network name (e.g., "base-sepolia").
    pub name: Cow<'static, str>,
    /// EIP-155 chain ID.
    pub chain_id: u64,
    /// Block explorer base URL, without a trailing slash.
    pub explorer: &'static str,
}

impl NetworkInfo {
    /// Creates a network definition with a static name.
    #[must_use]
    pub const fn new(name: &'static str, chain_id: u64, explorer: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            chain_id,
            explorer,
        }
    }

    /// Returns the explorer link for a transaction hash.
    #[must_use]
    pub fn explorer_tx_url(&self, tx_hash: impl std::fmt::Display) -> String {
        format!("{}/tx/{tx_hash}", self.explorer)
    }
}

/// Registry that maps v1 network names to [`NetworkInfo`] values and back.
///
/// Name lookups are case-insensitive.
///
/// # Example
///
/// ```ignore
/// use relay402::networks::NetworkRegistry;
///
/// let registry = NetworkRegistry::from_networks(relay402_evm::EVM_NETWORKS);
/// let base = registry.by_name("Base").unwrap();
/// assert_eq!(base.chain_id, 8453);
/// ```
#[derive(Debug, Clone, Default)]
pub struct NetworkRegistry {
    by_name: HashMap<String, NetworkInfo>,
    by_chain_id: HashMap<u64, NetworkInfo>,
}

impl NetworkRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-populated from a network info slice.
    #[must_use]
    pub fn from_networks(networks: &[NetworkInfo]) -> Self {
        let mut registry = Self::new();
        registry.register(networks);
        registry
    }

    /// Registers additional networks into this registry.
    pub fn register(&mut self, networks: &[NetworkInfo]) {
        for info in networks {
            self.by_name.insert(info.name.to_ascii_lowercase(), info.clone());
            self.by_chain_id.insert(info.chain_id, info.clone());
        }
    }

    /// Builder-style method: registers additional networks and returns `self`.
    #[must_use]
    pub fn with_networks(mut self, networks: &[NetworkInfo]) -> Self {
        self.register(networks);
        self
    }

    /// Looks up a network by its v1 name, ignoring case.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&NetworkInfo> {
        self.by_name.get(&name.to_ascii_lowercase())
    }

    /// Looks up a network by its chain ID.
    #[must_use]
    pub fn by_chain_id(&self, chain_id: u64) -> Option<&NetworkInfo> {
        self.by_chain_id.get(&chain_id)
    }

    /// Returns the number of registered networks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Returns `true` if no networks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
