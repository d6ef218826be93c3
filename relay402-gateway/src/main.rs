//! x402 payment gateway HTTP server.
//!
//! # Usage
//!
//! ```bash
//! RPC_URL=https://mainnet.base.org \
//! RELAYER_PRIVATE_KEYS=0xabc...,0xdef... \
//! cargo run -p relay402-gateway --release
//!
//! # Configure logging level
//! RUST_LOG=debug cargo run -p relay402-gateway
//! ```
//!
//! Run with `--help` for every flag and its environment variable.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use relay402_evm::chain::Eip155ChainProvider;
use relay402_evm::exact::{OnchainAsset, RelayEngine};
use relay402_evm::relayer::StrategyPool;

use relay402_gateway::config::GatewayConfig;
use relay402_gateway::handlers::{GatewayState, gateway_router};
use relay402_gateway::telemetry::Telemetry;
use relay402_gateway::util::SigDown;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let telemetry = Telemetry::init();

    let code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("Gateway failed: {e}");
            1
        }
    };
    drop(telemetry);
    std::process::exit(code);
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| "failed to install rustls crypto provider")?;

    let config = GatewayConfig::parse();
    let network = config.network_info()?;
    let asset_address = config.asset_address(network.chain_id)?;
    let payment_header = config.payment_header_name()?;
    tracing::info!(
        network = %network.name,
        chain_id = network.chain_id,
        asset = %asset_address,
        rpc_endpoints = config.rpc_url.len(),
        "Loaded configuration"
    );

    let keys = config.relayer_keys();
    if keys.is_empty() {
        tracing::warn!("No relayer keys configured; every paid request will fail");
    } else {
        tracing::info!(
            relayers = ?keys.addresses(),
            strategy = %config.relayer_strategy,
            "Relayer pool ready"
        );
    }

    let provider = Eip155ChainProvider::new(
        network.chain_id,
        keys.wallet(),
        &config.rpc_url,
        config.provider_config(),
    )?;
    let asset = OnchainAsset::new(Arc::new(provider), asset_address);
    let relayers = StrategyPool::new(config.relayer_strategy, keys.addresses());
    let engine = RelayEngine::new(asset, relayers, config.engine_settings(network.clone()));

    let challenge = config.challenge(&network, asset_address);
    let state = Arc::new(GatewayState::new(engine, challenge, payment_header));
    let app = gateway_router(state);

    let sig_down = SigDown::try_new()?;
    let token = sig_down.cancellation_token();

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Gateway listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { token.cancelled().await })
        .await?;
    sig_down.recv().await;

    tracing::info!("Gateway shut down gracefully");
    Ok(())
}
