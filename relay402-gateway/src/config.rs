//! Gateway configuration.
//!
//! Every setting is a command line flag with an environment variable
//! fallback. A `.env` file in the working directory is loaded before parsing.
//!
//! # Environment Variables
//!
//! - `HOST` / `PORT` — Bind address (default: `0.0.0.0:4021`)
//! - `RPC_URL` — Comma-separated RPC endpoints, tried in fallback order
//! - `RELAYER_PRIVATE_KEYS` — Comma-separated relayer keys
//! - `RELAYER_STRATEGY` — `random` (default) or `round-robin`
//! - `NETWORK` / `CHAIN_ID` — Network served (default: `base`)
//! - `ASSET_ADDRESS` / `ASSET_VERSION` — Token and its EIP-712 domain version
//! - `PAYMENT_HEADER` — Header carrying the proof (default: `X-PAYMENT`)
//! - `PAY_TO`, `MAX_AMOUNT_REQUIRED`, `RESOURCE_URL`, ... — 402 challenge terms

use std::borrow::Cow;
use std::net::IpAddr;
use std::time::Duration;

use alloy_primitives::Address;
use axum::http::HeaderName;
use clap::{ArgAction, Parser};
use relay402::networks::{NetworkInfo, NetworkRegistry};
use relay402_evm::chain::ChainProviderConfig;
use relay402_evm::exact::EngineSettings;
use relay402_evm::relayer::{RelayerKeys, RelayerStrategy};
use relay402_evm::{DEFAULT_USDC_NAME, DEFAULT_USDC_VERSION, EVM_NETWORKS, usdc_address};
use url::Url;

use crate::challenge::PaymentChallenge;

/// Explorer used for networks missing from the registry.
const FALLBACK_EXPLORER: &str = "https://blockscan.com";

/// Configuration errors detected at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The network name is unknown and no chain ID was given.
    #[error("unknown network `{0}`; set CHAIN_ID to serve it")]
    UnknownNetwork(String),
    /// The chain ID contradicts the registry entry of the network.
    #[error("network `{network}` has chain ID {expected}, but CHAIN_ID is {configured}")]
    ChainIdMismatch {
        /// Configured network name.
        network: String,
        /// Chain ID of that network in the registry.
        expected: u64,
        /// Configured chain ID.
        configured: u64,
    },
    /// No token address was given and none is known for the chain.
    #[error("no default asset for chain ID {0}; set ASSET_ADDRESS")]
    UnknownAsset(u64),
    /// The payment header name is not a valid HTTP header name.
    #[error("invalid payment header name `{0}`")]
    InvalidPaymentHeader(String),
}

/// Gateway configuration, parsed once at startup.
#[derive(Parser, Debug, Clone)]
#[command(name = "relay402-gateway")]
#[command(about = "x402 payment gateway relaying EIP-3009 authorizations")]
#[command(version)]
pub struct GatewayConfig {
    /// Server bind address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Server port
    #[arg(long, env = "PORT", default_value_t = 4021)]
    pub port: u16,

    /// RPC endpoints, comma-separated
    #[arg(long, env = "RPC_URL", value_delimiter = ',', required = true)]
    pub rpc_url: Vec<Url>,

    /// Requests per second allowed against each RPC endpoint
    #[arg(long, env = "RPC_RATE_LIMIT")]
    pub rpc_rate_limit: Option<u32>,

    /// Timeout in seconds for every RPC round trip, receipt wait included
    #[arg(long, env = "RPC_TIMEOUT_SECS", default_value_t = 30)]
    pub rpc_timeout_secs: u64,

    /// Relayer private keys, comma-separated
    #[arg(long, env = "RELAYER_PRIVATE_KEYS", hide_env_values = true)]
    pub relayer_private_keys: Option<RelayerKeys>,

    /// How a relayer is picked for each transfer
    #[arg(long, env = "RELAYER_STRATEGY", default_value_t = RelayerStrategy::Random)]
    pub relayer_strategy: RelayerStrategy,

    /// Network served, by x402 name
    #[arg(long, env = "NETWORK", default_value = "base")]
    pub network: String,

    /// Chain ID, required for networks outside the built-in registry
    #[arg(long, env = "CHAIN_ID")]
    pub chain_id: Option<u64>,

    /// Use legacy gas pricing instead of EIP-1559
    #[arg(long, env = "LEGACY_GAS")]
    pub legacy_gas: bool,

    /// Token contract address (default: USDC on the served chain)
    #[arg(long = "asset", env = "ASSET_ADDRESS")]
    pub asset: Option<Address>,

    /// EIP-712 domain version of the token
    #[arg(long, env = "ASSET_VERSION", default_value = DEFAULT_USDC_VERSION)]
    pub asset_version: String,

    /// Token name advertised in the 402 challenge
    #[arg(long, env = "ASSET_NAME", default_value = DEFAULT_USDC_NAME)]
    pub asset_name: String,

    /// Ask the token whether a nonce was used before submitting
    #[arg(long, env = "CHECK_AUTHORIZATION_STATE", default_value_t = true, action = ArgAction::Set)]
    pub check_authorization_state: bool,

    /// Request header carrying the payment proof
    #[arg(long, env = "PAYMENT_HEADER", default_value = "X-PAYMENT")]
    pub payment_header: String,

    /// Recipient advertised in the 402 challenge
    #[arg(long, env = "PAY_TO", default_value = "0x97311349bB9f5aBE89BaC32cb74a3EA7483Ffe43")]
    pub pay_to: Address,

    /// Price advertised in the 402 challenge, in token base units
    #[arg(long, env = "MAX_AMOUNT_REQUIRED", default_value = "1000000")]
    pub max_amount_required: String,

    /// Resource URL advertised in the 402 challenge (default: the request URL)
    #[arg(long, env = "RESOURCE_URL")]
    pub resource_url: Option<String>,

    /// Resource description advertised in the 402 challenge
    #[arg(long, env = "RESOURCE_DESCRIPTION", default_value = "Access to the paid resource")]
    pub description: String,

    /// Payment validity advertised in the 402 challenge, in seconds
    #[arg(long, env = "MAX_TIMEOUT_SECONDS", default_value_t = 300)]
    pub max_timeout_seconds: u64,

    /// Facilitator advertised in the 402 challenge
    #[arg(long, env = "FACILITATOR_URL", default_value = "https://facilitator.thirdweb.com")]
    pub facilitator_url: Option<String>,
}

impl GatewayConfig {
    /// Resolves the served network from `network` and `chain_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the network is unknown and no chain ID was
    /// given, or if the chain ID contradicts the registry.
    pub fn network_info(&self) -> Result<NetworkInfo, ConfigError> {
        let registry = NetworkRegistry::from_networks(EVM_NETWORKS);
        match (registry.by_name(&self.network), self.chain_id) {
            (Some(known), None) => Ok(known.clone()),
            (Some(known), Some(configured)) if known.chain_id == configured => Ok(known.clone()),
            (Some(known), Some(configured)) => Err(ConfigError::ChainIdMismatch {
                network: self.network.clone(),
                expected: known.chain_id,
                configured,
            }),
            (None, Some(chain_id)) => {
                let explorer = registry
                    .by_chain_id(chain_id)
                    .map_or(FALLBACK_EXPLORER, |known| known.explorer);
                Ok(NetworkInfo {
                    name: Cow::Owned(self.network.clone()),
                    chain_id,
                    explorer,
                })
            }
            (None, None) => Err(ConfigError::UnknownNetwork(self.network.clone())),
        }
    }

    /// Returns the configured token, or USDC on `chain_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownAsset`] if neither is available.
    pub fn asset_address(&self, chain_id: u64) -> Result<Address, ConfigError> {
        self.asset
            .or_else(|| usdc_address(chain_id))
            .ok_or(ConfigError::UnknownAsset(chain_id))
    }

    /// Returns the parsed payment header name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPaymentHeader`] if the name is not a
    /// valid header name.
    pub fn payment_header_name(&self) -> Result<HeaderName, ConfigError> {
        HeaderName::try_from(self.payment_header.trim())
            .map_err(|_| ConfigError::InvalidPaymentHeader(self.payment_header.clone()))
    }

    /// Returns the relayer keys; empty when none were configured.
    #[must_use]
    pub fn relayer_keys(&self) -> RelayerKeys {
        self.relayer_private_keys.clone().unwrap_or_default()
    }

    /// Returns the RPC timeout.
    #[must_use]
    pub const fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }

    /// Returns the provider settings derived from this configuration.
    #[must_use]
    pub const fn provider_config(&self) -> ChainProviderConfig {
        ChainProviderConfig {
            eip1559: !self.legacy_gas,
            receipt_timeout: self.rpc_timeout(),
            rate_limit: self.rpc_rate_limit,
        }
    }

    /// Returns the relay engine settings for `network`.
    #[must_use]
    pub fn engine_settings(&self, network: NetworkInfo) -> EngineSettings {
        EngineSettings {
            network,
            domain_version: self.asset_version.clone(),
            check_authorization_state: self.check_authorization_state,
            rpc_timeout: self.rpc_timeout(),
        }
    }

    /// Returns the 402 challenge for `network` and `asset`.
    #[must_use]
    pub fn challenge(&self, network: &NetworkInfo, asset: Address) -> PaymentChallenge {
        PaymentChallenge {
            network: network.name.to_string(),
            asset,
            asset_name: self.asset_name.clone(),
            asset_version: self.asset_version.clone(),
            pay_to: self.pay_to,
            max_amount_required: self.max_amount_required.clone(),
            resource: self.resource_url.clone(),
            description: self.description.clone(),
            max_timeout_seconds: self.max_timeout_seconds,
            facilitator: self.facilitator_url.clone().filter(|url| !url.is_empty()),
        }
    }
}
