//! The token contract as seen by the relay pipeline.
//!
//! [`Eip3009Asset`] is the seam between verification and the chain: the
//! pipeline only ever reads the token's name and authorization state and
//! asks for a transfer through it. [`OnchainAsset`] is the real
//! implementation over an [`Eip155ChainProvider`].

use std::future::Future;
use std::sync::Arc;

use alloy_primitives::{Address, B256};
#[cfg(feature = "telemetry")]
use tracing::{Level, instrument};

use super::contract::IEIP3009;
use super::error::RelayError;
use super::settle::{SignedTransfer, TransferReceipt};
use super::traced;
use crate::chain::{Eip155ChainProvider, MetaTransaction};
use crate::relayer::RelayerIdentity;

/// An EIP-3009 token deployment.
pub trait Eip3009Asset: Send + Sync {
    /// The token contract address (the EIP-712 `verifyingContract`).
    fn address(&self) -> Address;

    /// Reads the token's EIP-712 domain name, e.g. `"USD Coin"`.
    fn name(&self) -> impl Future<Output = Result<String, RelayError>> + Send;

    /// Returns `true` if `nonce` has already been used or cancelled by `authorizer`.
    fn authorization_state(
        &self,
        authorizer: Address,
        nonce: B256,
    ) -> impl Future<Output = Result<bool, RelayError>> + Send;

    /// Submits the transfer from `relayer` and waits for one confirmation.
    fn transfer_with_authorization(
        &self,
        relayer: RelayerIdentity,
        transfer: &SignedTransfer,
    ) -> impl Future<Output = Result<TransferReceipt, RelayError>> + Send;
}

impl<T: Eip3009Asset> Eip3009Asset for Arc<T> {
    fn address(&self) -> Address {
        (**self).address()
    }

    fn name(&self) -> impl Future<Output = Result<String, RelayError>> + Send {
        (**self).name()
    }

    fn authorization_state(
        &self,
        authorizer: Address,
        nonce: B256,
    ) -> impl Future<Output = Result<bool, RelayError>> + Send {
        (**self).authorization_state(authorizer, nonce)
    }

    fn transfer_with_authorization(
        &self,
        relayer: RelayerIdentity,
        transfer: &SignedTransfer,
    ) -> impl Future<Output = Result<TransferReceipt, RelayError>> + Send {
        (**self).transfer_with_authorization(relayer, transfer)
    }
}

/// A token contract reached through a live RPC provider.
#[derive(Debug, Clone)]
pub struct OnchainAsset {
    provider: Arc<Eip155ChainProvider>,
    address: Address,
}

impl OnchainAsset {
    /// Binds the token at `address` to `provider`.
    #[must_use]
    pub const fn new(provider: Arc<Eip155ChainProvider>, address: Address) -> Self {
        Self { provider, address }
    }

    fn contract(&self) -> IEIP3009::IEIP3009Instance<&crate::chain::InnerProvider> {
        IEIP3009::new(self.address, self.provider.inner())
    }
}

impl Eip3009Asset for OnchainAsset {
    fn address(&self) -> Address {
        self.address
    }

    async fn name(&self) -> Result<String, RelayError> {
        let contract = self.contract();
        let call = contract.name();
        let name_fut = call.call().into_future();
        let name = traced!(
            name_fut,
            tracing::info_span!("fetch_eip712_name",
                otel.kind = "client",
                asset = %self.address,
            )
        )?;
        Ok(name)
    }

    async fn authorization_state(&self, authorizer: Address, nonce: B256) -> Result<bool, RelayError> {
        let contract = self.contract();
        let call = contract.authorizationState(authorizer, nonce);
        let state_fut = call.call().into_future();
        let used = traced!(
            state_fut,
            tracing::info_span!("call_authorizationState",
                otel.kind = "client",
                authorizer = %authorizer,
                nonce = %nonce,
            )
        )?;
        Ok(used)
    }

    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(
        relayer = %relayer,
        from = %transfer.authorization.from,
        to = %transfer.authorization.to,
        value = %transfer.authorization.value,
        nonce = %transfer.authorization.nonce,
    )))]
    async fn transfer_with_authorization(
        &self,
        relayer: RelayerIdentity,
        transfer: &SignedTransfer,
    ) -> Result<TransferReceipt, RelayError> {
        let tx = MetaTransaction {
            from: relayer.address,
            to: self.address,
            calldata: transfer.calldata(),
            confirmations: 1,
        };
        let send_fut = self.provider.send_transaction(tx);
        let receipt = traced!(
            send_fut,
            tracing::info_span!("call_transferWithAuthorization",
                otel.kind = "client",
                relayer = %relayer,
            )
        )?;
        let outcome = TransferReceipt::from_receipt(&receipt, relayer);
        #[cfg(feature = "telemetry")]
        match &outcome {
            Ok(settled) => tracing::event!(Level::INFO,
                status = "ok",
                tx = %settled.tx_hash,
                block = ?settled.block_number,
                "transferWithAuthorization succeeded"
            ),
            Err(_) => tracing::event!(Level::WARN,
                status = "failed",
                tx = %receipt.transaction_hash,
                "transferWithAuthorization reverted"
            ),
        }
        outcome
    }
}
