//! EVM chain access: RPC transport, filler stack and relayer nonce tracking.
//!
//! Provides [`Eip155ChainProvider`] with:
//! - Throttled HTTP transports behind a fallback layer
//! - Full filler stack (gas, blob gas, nonce, chain ID, wallet)
//! - [`PendingNonceManager`] for concurrent nonce tracking with pending queries
//! - Automatic nonce reset on transaction failures, cancellation included

mod nonce;
mod provider;

pub use nonce::{NonceResetGuard, PendingNonceManager};
pub use provider::*;
