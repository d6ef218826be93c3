use std::num::NonZeroUsize;
use std::time::Duration;

use alloy_network::{Ethereum, EthereumWallet, NetworkWallet, TransactionBuilder};
use alloy_primitives::{Address, Bytes};
use alloy_provider::fillers::{
    BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller, WalletFiller,
};
use alloy_provider::{Identity, PendingTransactionError, Provider, ProviderBuilder, RootProvider};
use alloy_rpc_client::RpcClient;
use alloy_rpc_types_eth::{BlockId, TransactionReceipt, TransactionRequest};
use alloy_transport::TransportError;
use alloy_transport::layers::{FallbackLayer, ThrottleLayer};
use alloy_transport_http::Http;
use tower::ServiceBuilder;
#[cfg(feature = "telemetry")]
use tracing::Instrument;
use url::Url;

use super::PendingNonceManager;

/// Combined filler type: Gas + `BlobGas` + Nonce([`PendingNonceManager`]) + `ChainId`.
pub type InnerFiller = JoinFill<
    GasFiller,
    JoinFill<BlobGasFiller, JoinFill<NonceFiller<PendingNonceManager>, ChainIdFiller>>,
>;

/// Fully composed Ethereum provider with all fillers and wallet signing.
pub type InnerProvider = FillProvider<
    JoinFill<JoinFill<Identity, InnerFiller>, WalletFiller<EthereumWallet>>,
    RootProvider,
>;

/// Tuning knobs for [`Eip155ChainProvider`].
#[derive(Debug, Clone, Copy)]
pub struct ChainProviderConfig {
    /// Whether the chain supports EIP-1559 gas pricing (default: `true`).
    pub eip1559: bool,
    /// How long to wait for a transaction receipt (default: 30 seconds).
    pub receipt_timeout: Duration,
    /// Requests per second allowed against each RPC endpoint (default: unlimited).
    pub rate_limit: Option<u32>,
}

impl Default for ChainProviderConfig {
    fn default() -> Self {
        Self {
            eip1559: true,
            receipt_timeout: Duration::from_secs(30),
            rate_limit: None,
        }
    }
}

/// Errors raised while assembling the provider.
#[derive(Debug, thiserror::Error)]
pub enum ChainProviderError {
    /// None of the configured RPC URLs use `http` or `https`.
    #[error("no HTTP(S) RPC endpoint configured")]
    NoHttpEndpoint,
}

/// Provider for submitting relays to an EVM chain.
///
/// This provider handles:
/// - Transaction signing by whichever relayer the caller picked
/// - Nonce management with automatic reset on failures
/// - Gas estimation and pricing (EIP-1559 and legacy)
/// - Transaction receipt fetching with a configurable timeout
///
/// Relayer selection itself is not done here; see
/// [`RelayerPool`](crate::relayer::RelayerPool).
#[derive(Debug)]
pub struct Eip155ChainProvider {
    chain_id: u64,
    eip1559: bool,
    receipt_timeout: Duration,
    inner: InnerProvider,
    signer_addresses: Vec<Address>,
    nonce_manager: PendingNonceManager,
}

impl Eip155ChainProvider {
    /// Creates an RPC client from HTTP endpoint URLs.
    ///
    /// Each endpoint is throttled to `rate_limit` requests per second and all
    /// of them sit behind a fallback layer. Non-HTTP(S) URLs are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ChainProviderError::NoHttpEndpoint`] if no HTTP transport remains.
    #[allow(unused_variables)] // chain_id is needed for tracing only
    pub fn rpc_client(
        chain_id: u64,
        endpoints: &[Url],
        rate_limit: Option<u32>,
    ) -> Result<RpcClient, ChainProviderError> {
        let transports = endpoints
            .iter()
            .filter(|url| matches!(url.scheme(), "http" | "https"))
            .map(|url| {
                #[cfg(feature = "telemetry")]
                tracing::info!(chain_id, rpc_url = %url, rate_limit = ?rate_limit, "Using HTTP transport");
                ServiceBuilder::new()
                    .layer(ThrottleLayer::new(rate_limit.unwrap_or(u32::MAX)))
                    .service(Http::new(url.clone()))
            })
            .collect::<Vec<_>>();
        let active = NonZeroUsize::new(transports.len()).ok_or(ChainProviderError::NoHttpEndpoint)?;
        let fallback = ServiceBuilder::new()
            .layer(FallbackLayer::default().with_active_transport_count(active))
            .service(transports);
        Ok(RpcClient::new(fallback, false))
    }

    /// Creates a new EVM chain provider.
    ///
    /// `wallet` holds every relayer key; it may be empty, in which case reads
    /// work but every submission fails.
    ///
    /// # Errors
    ///
    /// Returns [`ChainProviderError`] if the RPC client cannot be built.
    pub fn new(
        chain_id: u64,
        wallet: EthereumWallet,
        rpc_endpoints: &[Url],
        config: ChainProviderConfig,
    ) -> Result<Self, ChainProviderError> {
        let signer_addresses: Vec<Address> =
            NetworkWallet::<Ethereum>::signer_addresses(&wallet).collect();
        let client = Self::rpc_client(chain_id, rpc_endpoints, config.rate_limit)?;

        let nonce_manager = PendingNonceManager::default();
        let filler = JoinFill::new(
            GasFiller,
            JoinFill::new(
                BlobGasFiller::default(),
                JoinFill::new(
                    NonceFiller::new(nonce_manager.clone()),
                    ChainIdFiller::new(Some(chain_id)),
                ),
            ),
        );
        let inner: InnerProvider = ProviderBuilder::default()
            .filler(filler)
            .wallet(wallet)
            .connect_client(client);

        #[cfg(feature = "telemetry")]
        tracing::info!(chain_id, relayers = signer_addresses.len(), "Using EVM provider");

        Ok(Self {
            chain_id,
            eip1559: config.eip1559,
            receipt_timeout: config.receipt_timeout,
            inner,
            signer_addresses,
            nonce_manager,
        })
    }

    /// Returns the underlying alloy provider for contract reads.
    #[must_use]
    pub const fn inner(&self) -> &InnerProvider {
        &self.inner
    }

    /// Returns the chain ID this provider signs for.
    #[must_use]
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Returns the addresses of every relayer key in the wallet.
    #[must_use]
    pub fn signer_addresses(&self) -> &[Address] {
        &self.signer_addresses
    }

    /// Sends a meta-transaction from the relayer named in `tx.from`.
    ///
    /// Gas is estimated against the pending block. On legacy networks the gas
    /// price is fetched and set explicitly; on EIP-1559 networks the fillers
    /// handle pricing.
    ///
    /// If the transaction fails at any point (during submission or receipt
    /// fetching), the relayer's nonce is reset to force a fresh query on the
    /// next transaction, since the transaction may or may not have reached the
    /// mempool. The reset also happens when this future is dropped before the
    /// receipt arrives.
    ///
    /// # Errors
    ///
    /// Returns [`MetaTransactionSendError`] if the relayer is unknown, gas
    /// estimation or submission fails, or the receipt does not arrive within
    /// the configured timeout.
    pub async fn send_transaction(
        &self,
        tx: MetaTransaction,
    ) -> Result<TransactionReceipt, MetaTransactionSendError> {
        let from_address = tx.from;
        if !self.signer_addresses.contains(&from_address) {
            return Err(MetaTransactionSendError::UnknownRelayer(from_address));
        }
        let mut txr = TransactionRequest::default()
            .with_to(tx.to)
            .with_from(from_address)
            .with_input(tx.calldata);

        if !self.eip1559 {
            let gas_fut = self.inner.get_gas_price();
            #[cfg(feature = "telemetry")]
            let gas: u128 = gas_fut
                .instrument(tracing::info_span!("get_gas_price"))
                .await?;
            #[cfg(not(feature = "telemetry"))]
            let gas: u128 = gas_fut.await?;
            txr.set_gas_price(gas);
        }

        let gas_limit = self
            .inner
            .estimate_gas(txr.clone())
            .block(BlockId::pending())
            .await?;
        txr.set_gas_limit(gas_limit);

        let nonce_guard = self.nonce_manager.reset_guard(from_address);
        let pending_tx = self.inner.send_transaction(txr).await?;

        #[cfg(feature = "telemetry")]
        tracing::debug!(
            relayer = %from_address,
            nonce = ?self.nonce_manager.cached_nonce(from_address),
            tx = %pending_tx.tx_hash(),
            "Transaction broadcast"
        );

        let watcher = pending_tx
            .with_required_confirmations(tx.confirmations)
            .with_timeout(Some(self.receipt_timeout));

        let receipt = watcher.get_receipt().await?;
        nonce_guard.disarm();
        Ok(receipt)
    }
}

/// Errors that can occur when sending a meta-transaction.
#[derive(Debug, thiserror::Error)]
pub enum MetaTransactionSendError {
    /// RPC transport error, including gas estimation reverts.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Pending transaction error (receipt timeout, dropped transaction).
    #[error(transparent)]
    PendingTransaction(#[from] PendingTransactionError),
    /// The requested relayer has no key in the wallet.
    #[error("relayer {0} has no signing key")]
    UnknownRelayer(Address),
}

/// Meta-transaction parameters: sender, target, calldata and confirmations.
#[derive(Debug, Clone)]
pub struct MetaTransaction {
    /// Relayer account paying gas.
    pub from: Address,
    /// Target contract address.
    pub to: Address,
    /// Transaction calldata (encoded function call).
    pub calldata: Bytes,
    /// Number of block confirmations to wait for.
    pub confirmations: u64,
}
