use std::sync::Arc;

use alloy_network::Network;
use alloy_primitives::Address;
use alloy_provider::Provider;
use alloy_provider::fillers::NonceManager;
use alloy_transport::TransportResult;
use dashmap::DashMap;
use tokio::sync::Mutex;

/// Nonce manager that queries pending transactions for the initial nonce.
///
/// Unlike alloy's default `CachedNonceManager` which uses the `latest`
/// transaction count, this manager queries with `.pending()` on first use,
/// which includes transactions still in the mempool. This prevents
/// "nonce too low" errors when the gateway restarts while relays are still
/// pending.
///
/// - **First call per relayer**: queries with `.pending()` from RPC
/// - **Subsequent calls**: increments cached nonce locally
/// - **On failure**: [`reset_nonce`](Self::reset_nonce) forces re-query
///
/// Each relayer has its own lock, so concurrent relays through different
/// relayers never wait on each other.
#[derive(Clone, Debug, Default)]
pub struct PendingNonceManager {
    nonces: Arc<DashMap<Address, Arc<Mutex<u64>>>>,
}

const NONCE_UNSET: u64 = u64::MAX;

#[async_trait::async_trait]
impl NonceManager for PendingNonceManager {
    async fn get_next_nonce<P, N>(&self, provider: &P, address: Address) -> TransportResult<u64>
    where
        P: Provider<N>,
        N: Network,
    {
        let slot = {
            let entry = self
                .nonces
                .entry(address)
                .or_insert_with(|| Arc::new(Mutex::new(NONCE_UNSET)));
            Arc::clone(entry.value())
        };

        let mut nonce = slot.lock().await;
        let new_nonce = if *nonce == NONCE_UNSET {
            provider.get_transaction_count(address).pending().await?
        } else {
            *nonce + 1
        };
        *nonce = new_nonce;
        Ok(new_nonce)
    }
}

impl PendingNonceManager {
    /// Resets the cached nonce for a relayer, forcing a fresh RPC query
    /// on next use.
    ///
    /// Call this when a transaction fails, as the on-chain state may be
    /// uncertain (the transaction may or may not have reached the mempool).
    pub fn reset_nonce(&self, address: Address) {
        self.nonces.remove(&address);
    }

    /// Returns a guard that resets `address`'s nonce when dropped, unless
    /// [`NonceResetGuard::disarm`] was called first.
    ///
    /// The guard also fires when the future holding it is cancelled, for
    /// example by an outer timeout while a receipt is still pending.
    #[must_use]
    pub const fn reset_guard(&self, address: Address) -> NonceResetGuard<'_> {
        NonceResetGuard {
            manager: self,
            address,
            armed: true,
        }
    }

    /// Returns the last nonce handed out for `address`, if any.
    #[must_use]
    pub fn cached_nonce(&self, address: Address) -> Option<u64> {
        let slot = self.nonces.get(&address)?;
        let nonce = slot.value().try_lock().ok().map(|n| *n)?;
        (nonce != NONCE_UNSET).then_some(nonce)
    }
}

/// Resets a relayer's cached nonce on drop unless disarmed.
#[derive(Debug)]
pub struct NonceResetGuard<'a> {
    manager: &'a PendingNonceManager,
    address: Address,
    armed: bool,
}

impl NonceResetGuard<'_> {
    /// Keeps the cached nonce: the transaction it was used for is confirmed.
    pub fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for NonceResetGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.manager.reset_nonce(self.address);
        }
    }
}
