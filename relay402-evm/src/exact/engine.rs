//! The verification and relay pipeline.
//!
//! [`RelayEngine::relay`] takes the raw payment header value and runs every
//! stage in order, stopping at the first failure:
//!
//! 1. decode the header ([`relay402::encoding`])
//! 2. check protocol version, scheme, network and field presence
//! 3. check the validity window
//! 4. rebuild the EIP-712 domain with the token's live `name()`
//! 5. recover the signer and compare it with `from`
//! 6. optionally ask the token whether the nonce was already used
//! 7. acquire a relayer, submit, release the relayer
//!
//! An expired or not-yet-valid authorization is rejected before any RPC call,
//! whatever its signature. Nothing reaches the chain unless stages 1 to 6
//! passed, and a transfer is submitted at most once per call. The engine keeps no per-request state.

use std::future::Future;
use std::time::Duration;

use alloy_primitives::{Address, TxHash};
use relay402::encoding::decode_payment_header;
use relay402::networks::NetworkInfo;
use relay402::proto::{PaymentProof, PaymentVerificationError};
use relay402::timestamp::UnixTimestamp;
use relay402::validate::{ProtocolValidator, assert_time};
#[cfg(feature = "telemetry")]
use tracing::instrument;

use super::asset::Eip3009Asset;
use super::domain::{AssetDomain, signing_hash};
use super::error::RelayError;
use super::settle::SignedTransfer;
use super::signature::verify_signature;
use crate::relayer::RelayerPool;

/// Static settings of a [`RelayEngine`].
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// The single network this gateway serves.
    pub network: NetworkInfo,
    /// EIP-712 domain `version` of the token.
    pub domain_version: String,
    /// Query `authorizationState` before submitting.
    pub check_authorization_state: bool,
    /// Upper bound for every RPC round trip, submission included.
    pub rpc_timeout: Duration,
}

/// Result of a successful relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    /// Hash of the relay transaction.
    pub tx_hash: TxHash,
    /// Block that confirmed it.
    pub block_number: Option<u64>,
    /// Explorer link for the transaction.
    pub explorer: String,
    /// The payer whose tokens moved.
    pub payer: Address,
    /// The relayer that paid gas.
    pub relayer: Address,
}

/// Verifies payment proofs and relays them on-chain.
#[derive(Debug)]
pub struct RelayEngine<A, P> {
    asset: A,
    relayers: P,
    validator: ProtocolValidator,
    domain: AssetDomain,
    settings: EngineSettings,
}

impl<A, P> RelayEngine<A, P>
where
    A: Eip3009Asset,
    P: RelayerPool,
{
    /// Creates an engine for `asset`, relaying through `relayers`.
    pub fn new(asset: A, relayers: P, settings: EngineSettings) -> Self {
        let validator = ProtocolValidator::new(settings.network.name.clone());
        let domain = AssetDomain {
            version: settings.domain_version.clone(),
            chain_id: settings.network.chain_id,
            verifying_contract: asset.address(),
        };
        Self {
            asset,
            relayers,
            validator,
            domain,
            settings,
        }
    }

    /// Returns the engine settings.
    pub const fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Returns the token this engine relays for.
    pub const fn asset(&self) -> &A {
        &self.asset
    }

    /// Runs the full pipeline for one payment header value.
    ///
    /// # Errors
    ///
    /// Returns the [`RelayError`] of the first stage that failed.
    pub async fn relay(&self, header: &str) -> Result<Settlement, RelayError> {
        self.relay_at(header, UnixTimestamp::now()).await
    }

    /// Runs the full pipeline with an explicit clock.
    ///
    /// # Errors
    ///
    /// Returns the [`RelayError`] of the first stage that failed.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(
        network = %self.settings.network.name,
        asset = %self.domain.verifying_contract,
    )))]
    pub async fn relay_at(&self, header: &str, now: UnixTimestamp) -> Result<Settlement, RelayError> {
        let document = decode_payment_header(header)?;
        let proof = self.validator.validate(&document)?;
        #[cfg(feature = "telemetry")]
        tracing::debug!(
            from = %proof.authorization.from,
            nonce = %proof.authorization.nonce,
            "Payment proof decoded and protocol checked"
        );
        let transfer = self.verify(&proof, now).await?;
        self.submit(&transfer).await
    }

    /// Runs every check that does not spend gas: validity window, typed-data
    /// reconstruction, signature and, if enabled, the replay pre-check.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Verification`] if the proof is rejected, or
    /// [`RelayError::Internal`] if the token could not be queried.
    pub async fn verify(
        &self,
        proof: &PaymentProof,
        now: UnixTimestamp,
    ) -> Result<SignedTransfer, RelayError> {
        let authorization = &proof.authorization;

        assert_time(authorization.valid_after, authorization.valid_before, now)?;
        #[cfg(feature = "telemetry")]
        tracing::debug!(from = %authorization.from, "Validity window checked");

        let name = self.bounded(self.asset.name(), "name()").await?;
        let domain = self.domain.with_name(name);
        let hash = signing_hash(authorization, &domain);
        #[cfg(feature = "telemetry")]
        tracing::debug!(from = %authorization.from, %hash, "EIP-712 domain reconstructed");

        let signature = verify_signature(authorization, &proof.signature, &hash)?;
        #[cfg(feature = "telemetry")]
        tracing::debug!(from = %authorization.from, "Signature verified");

        if self.settings.check_authorization_state {
            let used = self
                .bounded(
                    self.asset
                        .authorization_state(authorization.from, authorization.nonce),
                    "authorizationState()",
                )
                .await?;
            if used {
                return Err(PaymentVerificationError::NonceAlreadyUsed.into());
            }
            #[cfg(feature = "telemetry")]
            tracing::debug!(nonce = %authorization.nonce, "Authorization unused");
        }

        Ok(SignedTransfer {
            authorization: *authorization,
            signature,
        })
    }

    /// Acquires a relayer, submits the transfer once and releases the relayer.
    async fn submit(&self, transfer: &SignedTransfer) -> Result<Settlement, RelayError> {
        let relayer = self.relayers.acquire()?;
        #[cfg(feature = "telemetry")]
        tracing::debug!(%relayer, nonce = %transfer.authorization.nonce, "Relayer chosen");

        let outcome = tokio::time::timeout(
            self.settings.rpc_timeout,
            self.asset.transfer_with_authorization(relayer, transfer),
        )
        .await;
        self.relayers.release(relayer);

        let receipt = outcome.map_err(|_| {
            RelayError::relay_failed(format!(
                "transaction not confirmed within {}s",
                self.settings.rpc_timeout.as_secs()
            ))
        })??;

        Ok(Settlement {
            tx_hash: receipt.tx_hash,
            block_number: receipt.block_number,
            explorer: self.settings.network.explorer_tx_url(receipt.tx_hash),
            payer: transfer.authorization.from,
            relayer: receipt.relayer.address,
        })
    }

    /// Applies the RPC timeout to a read; a timeout is an internal error.
    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, RelayError>>,
        what: &str,
    ) -> Result<T, RelayError> {
        tokio::time::timeout(self.settings.rpc_timeout, fut)
            .await
            .map_err(|_| {
                RelayError::Internal(format!(
                    "{what} did not answer within {}s",
                    self.settings.rpc_timeout.as_secs()
                ))
            })?
    }
}
