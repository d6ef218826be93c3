//! Wire format types for the x402 v1 `exact` scheme.
//!
//! - [`PaymentProofDocument`] is the loosely typed JSON carried in the payment
//!   header, exactly as the client sent it.
//! - [`PaymentProof`] is the strictly typed, validated form every later stage
//!   works on.
//! - [`PaymentRequired`] / [`PaymentRequirements`] form the HTTP 402 challenge.

mod error;
mod payload;
mod requirements;
mod version;

pub use error::*;
pub use payload::*;
pub use requirements::*;
pub use version::*;

/// The x402 protocol version this crate speaks.
pub type X402Version1 = Version<1>;

/// Name of the only payment scheme supported: an exact-amount EIP-3009 transfer.
pub const EXACT_SCHEME: &str = "exact";
