//! Relayer accounts and how one is chosen per request.
//!
//! A relayer is an operator-controlled account that pays gas to submit a
//! payer's signed authorization. It is never the sender of the transferred
//! value. Keys are loaded once at startup into the provider's wallet; the pool
//! only hands out addresses.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use alloy_network::EthereumWallet;
use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use rand::seq::IndexedRandom;

/// An operational signing identity chosen to submit one relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelayerIdentity {
    /// Account that signs and pays for the transaction.
    pub address: Address,
}

impl fmt::Display for RelayerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.address, f)
    }
}

/// Errors from the relayer pool.
#[derive(Debug, thiserror::Error)]
pub enum RelayerPoolError {
    /// No relayer keys were configured.
    #[error("no relayer keys configured")]
    Empty,
}

/// Errors raised while parsing relayer keys.
#[derive(Debug, thiserror::Error)]
pub enum RelayerKeyError {
    /// Entry at `index` is not a valid secp256k1 private key.
    #[error("relayer key #{index} is not a valid private key")]
    InvalidKey {
        /// Zero-based position in the comma-separated list.
        index: usize,
    },
}

/// Relayer private keys parsed from a comma-separated list.
///
/// Entries are trimmed, empty entries are dropped and a missing `0x` prefix
/// is added. Key material never appears in `Debug` output or errors.
#[derive(Clone, Default)]
pub struct RelayerKeys {
    signers: Vec<PrivateKeySigner>,
}

impl fmt::Debug for RelayerKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayerKeys")
            .field("addresses", &self.addresses())
            .finish()
    }
}

impl FromStr for RelayerKeys {
    type Err = RelayerKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let signers = s
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .enumerate()
            .map(|(index, entry)| {
                let key = if entry.starts_with("0x") {
                    entry.to_owned()
                } else {
                    format!("0x{entry}")
                };
                key.parse::<PrivateKeySigner>()
                    .map_err(|_| RelayerKeyError::InvalidKey { index })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { signers })
    }
}

impl RelayerKeys {
    /// Wraps already-built signers.
    #[must_use]
    pub const fn new(signers: Vec<PrivateKeySigner>) -> Self {
        Self { signers }
    }

    /// Returns the relayer addresses in configuration order.
    #[must_use]
    pub fn addresses(&self) -> Vec<Address> {
        self.signers.iter().map(PrivateKeySigner::address).collect()
    }

    /// Returns the number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.signers.len()
    }

    /// Returns `true` if no keys were configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }

    /// Builds a wallet holding every key, for the chain provider.
    #[must_use]
    pub fn wallet(&self) -> EthereumWallet {
        let mut wallet = EthereumWallet::default();
        for (index, signer) in self.signers.iter().enumerate() {
            if index == 0 {
                wallet.register_default_signer(signer.clone());
            } else {
                wallet.register_signer(signer.clone());
            }
        }
        wallet
    }
}

/// A source of relayer identities.
///
/// `acquire` is called once per relay, after every verification stage has
/// passed; `release` is called once the submission has finished, whatever
/// its outcome.
pub trait RelayerPool: Send + Sync {
    /// Picks the relayer for the next submission.
    ///
    /// # Errors
    ///
    /// Returns [`RelayerPoolError::Empty`] if no relayer is configured.
    fn acquire(&self) -> Result<RelayerIdentity, RelayerPoolError>;

    /// Returns a relayer to the pool.
    fn release(&self, identity: RelayerIdentity) {
        let _ = identity;
    }
}

/// Picks a relayer uniformly at random on every request.
#[derive(Debug, Clone)]
pub struct RandomRelayerPool {
    relayers: Vec<RelayerIdentity>,
}

impl RandomRelayerPool {
    /// Creates a pool over `addresses`.
    #[must_use]
    pub fn new(addresses: impl IntoIterator<Item = Address>) -> Self {
        Self {
            relayers: addresses
                .into_iter()
                .map(|address| RelayerIdentity { address })
                .collect(),
        }
    }
}

impl RelayerPool for RandomRelayerPool {
    fn acquire(&self) -> Result<RelayerIdentity, RelayerPoolError> {
        self.relayers
            .choose(&mut rand::rng())
            .copied()
            .ok_or(RelayerPoolError::Empty)
    }
}

/// Rotates through relayers in configuration order.
#[derive(Debug)]
pub struct RoundRobinRelayerPool {
    relayers: Vec<RelayerIdentity>,
    cursor: AtomicUsize,
}

impl RoundRobinRelayerPool {
    /// Creates a pool over `addresses`.
    #[must_use]
    pub fn new(addresses: impl IntoIterator<Item = Address>) -> Self {
        Self {
            relayers: addresses
                .into_iter()
                .map(|address| RelayerIdentity { address })
                .collect(),
            cursor: AtomicUsize::new(0),
        }
    }
}

impl RelayerPool for RoundRobinRelayerPool {
    fn acquire(&self) -> Result<RelayerIdentity, RelayerPoolError> {
        match self.relayers.len() {
            0 => Err(RelayerPoolError::Empty),
            1 => Ok(self.relayers[0]),
            len => {
                let next = self.cursor.fetch_add(1, Ordering::Relaxed) % len;
                Ok(self.relayers[next])
            }
        }
    }
}

/// How relayers are picked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RelayerStrategy {
    /// Uniformly at random per request.
    #[default]
    Random,
    /// In turn, in configuration order.
    RoundRobin,
}

impl FromStr for RelayerStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "round-robin" | "round_robin" | "roundrobin" => Ok(Self::RoundRobin),
            other => Err(format!(
                "unknown relayer strategy `{other}`, expected `random` or `round-robin`"
            )),
        }
    }
}

impl fmt::Display for RelayerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Random => "random",
            Self::RoundRobin => "round-robin",
        })
    }
}

/// A pool built from a [`RelayerStrategy`] at startup.
#[derive(Debug)]
pub enum StrategyPool {
    /// See [`RandomRelayerPool`].
    Random(RandomRelayerPool),
    /// See [`RoundRobinRelayerPool`].
    RoundRobin(RoundRobinRelayerPool),
}

impl StrategyPool {
    /// Builds the pool for `strategy` over `addresses`.
    #[must_use]
    pub fn new(strategy: RelayerStrategy, addresses: Vec<Address>) -> Self {
        match strategy {
            RelayerStrategy::Random => Self::Random(RandomRelayerPool::new(addresses)),
            RelayerStrategy::RoundRobin => Self::RoundRobin(RoundRobinRelayerPool::new(addresses)),
        }
    }
}

impl RelayerPool for StrategyPool {
    fn acquire(&self) -> Result<RelayerIdentity, RelayerPoolError> {
        match self {
            Self::Random(pool) => pool.acquire(),
            Self::RoundRobin(pool) => pool.acquire(),
        }
    }

    fn release(&self, identity: RelayerIdentity) {
        match self {
            Self::Random(pool) => pool.release(identity),
            Self::RoundRobin(pool) => pool.release(identity),
        }
    }
}
