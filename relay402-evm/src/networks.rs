//! Known EVM networks and USDC token deployments.

use alloy_primitives::{Address, address};
use relay402::networks::NetworkInfo;

/// Base Mainnet chain ID.
pub const BASE_MAINNET: u64 = 8453;

/// Base Sepolia (testnet) chain ID.
pub const BASE_SEPOLIA: u64 = 84532;

/// Polygon Mainnet chain ID.
pub const POLYGON_MAINNET: u64 = 137;

/// Polygon Amoy (testnet) chain ID.
pub const POLYGON_AMOY: u64 = 80002;

/// Avalanche C-Chain chain ID.
pub const AVALANCHE_MAINNET: u64 = 43114;

/// Avalanche Fuji (testnet) chain ID.
pub const AVALANCHE_FUJI: u64 = 43113;

/// Ethereum Mainnet chain ID.
pub const ETHEREUM_MAINNET: u64 = 1;

/// Celo Mainnet chain ID.
pub const CELO_MAINNET: u64 = 42220;

/// USDC contract address on Base Mainnet.
pub const USDC_BASE: Address = address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");

/// USDC contract address on Base Sepolia.
pub const USDC_BASE_SEPOLIA: Address = address!("036CbD53842c5426634e7929541eC2318f3dCF7e");

/// USDC contract address on Ethereum Mainnet.
pub const USDC_ETHEREUM: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");

/// USDC contract address on Polygon Mainnet.
pub const USDC_POLYGON: Address = address!("3c499c542cEF5E3811e1192ce70d8cC03d5c3359");

/// Default EIP-712 domain name for USDC.
///
/// Only advertised in 402 challenges; verification always reads `name()`
/// from the contract.
pub const DEFAULT_USDC_NAME: &str = "USD Coin";

/// Default EIP-712 domain version for USDC.
pub const DEFAULT_USDC_VERSION: &str = "2";

/// Well-known EVM networks addressable by their x402 v1 names.
pub const EVM_NETWORKS: &[NetworkInfo] = &[
    NetworkInfo::new("base", BASE_MAINNET, "https://basescan.org"),
    NetworkInfo::new("base-sepolia", BASE_SEPOLIA, "https://sepolia.basescan.org"),
    NetworkInfo::new("ethereum", ETHEREUM_MAINNET, "https://etherscan.io"),
    NetworkInfo::new("polygon", POLYGON_MAINNET, "https://polygonscan.com"),
    NetworkInfo::new("polygon-amoy", POLYGON_AMOY, "https://amoy.polygonscan.com"),
    NetworkInfo::new("avalanche", AVALANCHE_MAINNET, "https://snowtrace.io"),
    NetworkInfo::new("avalanche-fuji", AVALANCHE_FUJI, "https://testnet.snowtrace.io"),
    NetworkInfo::new("celo", CELO_MAINNET, "https://celoscan.io"),
];

/// Returns the canonical USDC deployment for a chain, if one is known.
#[must_use]
pub const fn usdc_address(chain_id: u64) -> Option<Address> {
    match chain_id {
        BASE_MAINNET => Some(USDC_BASE),
        BASE_SEPOLIA => Some(USDC_BASE_SEPOLIA),
        ETHEREUM_MAINNET => Some(USDC_ETHEREUM),
        POLYGON_MAINNET => Some(USDC_POLYGON),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay402::networks::NetworkRegistry;

    #[test]
    fn test_base_is_registered() {
        let registry = NetworkRegistry::from_networks(EVM_NETWORKS);
        let base = registry.by_name("base").unwrap();
        assert_eq!(base.chain_id, BASE_MAINNET);
        assert_eq!(usdc_address(base.chain_id), Some(USDC_BASE));
        assert_eq!(registry.len(), EVM_NETWORKS.len());
    }
}
