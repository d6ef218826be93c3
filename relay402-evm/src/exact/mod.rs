//! The EIP-3009 `exact` scheme: verify a signed `transferWithAuthorization`
//! and relay it on-chain.
//!
//! Stages, in pipeline order:
//!
//! - [`domain`] rebuilds the EIP-712 domain and message the payer signed
//! - [`signature`] recovers the signer and compares it with `from`
//! - [`asset`] talks to the token contract (name, replay state, transfer)
//! - [`settle`] prepares the `(v, r, s)` call and interprets the receipt
//! - [`engine`] runs the whole pipeline for one header value

pub mod asset;
pub mod contract;
pub mod domain;
pub mod engine;
pub mod error;
pub mod settle;
pub mod signature;
mod types;

pub use asset::{Eip3009Asset, OnchainAsset};
pub use engine::{EngineSettings, RelayEngine, Settlement};
pub use error::RelayError;
pub use settle::{SignedTransfer, TransferReceipt};
pub use types::TransferWithAuthorization;

/// Awaits a future, optionally instrumenting it with a tracing span.
macro_rules! traced {
    ($fut:expr, $span:expr) => {{
        #[cfg(feature = "telemetry")]
        {
            use tracing::Instrument;
            $fut.instrument($span).await
        }
        #[cfg(not(feature = "telemetry"))]
        {
            $fut.await
        }
    }};
}
pub(crate) use traced;
