//! Error types for x402 payment proof verification.
//!
//! This module defines the structured errors produced while a payment proof is
//! decoded and checked, along with machine-readable reason codes.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Errors that reject a payment proof before anything is sent on-chain.
///
/// Every variant is the client's fault: the proof is unusable as presented.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PaymentVerificationError {
    /// The header is not base64url, not UTF-8, not JSON, or a field has the
    /// wrong shape.
    #[error("Malformed payment proof: {0}")]
    MalformedProof(String),
    /// `x402Version` is missing or not `1`.
    #[error("Unsupported x402Version: {}, expected 1", display_version(.0))]
    UnsupportedVersion(Option<u64>),
    /// The scheme is not `exact`.
    #[error("Unsupported scheme `{0}`, expected `exact`")]
    UnsupportedScheme(String),
    /// The proof targets a different network than the one served here.
    #[error("Network mismatch: proof targets `{actual}`, expected `{expected}`")]
    NetworkMismatch {
        /// Network served by this gateway.
        expected: String,
        /// Network named in the proof.
        actual: String,
    },
    /// A required field is absent. Carries the full dotted path.
    #[error("Missing required field `{0}`")]
    MissingField(&'static str),
    /// The signature does not recover to the claimed payer.
    #[error("Invalid signature: signer is not {expected}")]
    InvalidSignature {
        /// The `from` address claimed by the authorization.
        expected: Address,
        /// The address the signature recovered to, if recovery succeeded.
        recovered: Option<Address>,
    },
    /// The authorization's `validBefore` timestamp has passed.
    #[error("Payment authorization is expired")]
    Expired,
    /// The authorization's `validAfter` timestamp is in the future.
    #[error("Payment authorization is not yet valid")]
    Early,
    /// The EIP-3009 authorization nonce has already been consumed on-chain.
    #[error("Authorization already used")]
    NonceAlreadyUsed,
}

fn display_version(version: &Option<u64>) -> String {
    version.map_or_else(|| "missing".to_owned(), |v| v.to_string())
}

impl AsPaymentProblem for PaymentVerificationError {
    fn as_payment_problem(&self) -> PaymentProblem {
        let error_reason = match self {
            Self::MalformedProof(_) => ErrorReason::MalformedProof,
            Self::UnsupportedVersion(_) => ErrorReason::UnsupportedVersion,
            Self::UnsupportedScheme(_) => ErrorReason::UnsupportedScheme,
            Self::NetworkMismatch { .. } => ErrorReason::NetworkMismatch,
            Self::MissingField(_) => ErrorReason::MissingField,
            Self::InvalidSignature { .. } => ErrorReason::InvalidSignature,
            Self::Expired => ErrorReason::AuthorizationExpired,
            Self::Early => ErrorReason::AuthorizationNotYetValid,
            Self::NonceAlreadyUsed => ErrorReason::AuthorizationAlreadyUsed,
        };
        PaymentProblem::new(error_reason, self.to_string())
    }
}

impl From<serde_json::Error> for PaymentVerificationError {
    fn from(value: serde_json::Error) -> Self {
        Self::MalformedProof(value.to_string())
    }
}

/// Machine-readable error reason codes for payment failures.
///
/// These codes are used in error responses to allow clients to
/// programmatically handle different failure scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorReason {
    /// The payment header could not be decoded.
    MalformedProof,
    /// The protocol version is not supported.
    UnsupportedVersion,
    /// The scheme is not supported.
    UnsupportedScheme,
    /// The network does not match.
    NetworkMismatch,
    /// A required field is missing.
    MissingField,
    /// The signature is invalid.
    InvalidSignature,
    /// The payment authorization has expired.
    AuthorizationExpired,
    /// The payment authorization is not yet valid.
    AuthorizationNotYetValid,
    /// The authorization nonce has already been used.
    AuthorizationAlreadyUsed,
    /// The gateway is misconfigured (e.g. no relayer available).
    ConfigurationError,
    /// The on-chain transfer could not be executed.
    RelayFailed,
    /// An unexpected error occurred.
    UnexpectedError,
}

impl ErrorReason {
    /// Returns the `snake_case` string representation matching the wire format.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedProof => "malformed_proof",
            Self::UnsupportedVersion => "unsupported_version",
            Self::UnsupportedScheme => "unsupported_scheme",
            Self::NetworkMismatch => "network_mismatch",
            Self::MissingField => "missing_field",
            Self::InvalidSignature => "invalid_signature",
            Self::AuthorizationExpired => "authorization_expired",
            Self::AuthorizationNotYetValid => "authorization_not_yet_valid",
            Self::AuthorizationAlreadyUsed => "authorization_already_used",
            Self::ConfigurationError => "configuration_error",
            Self::RelayFailed => "relay_failed",
            Self::UnexpectedError => "unexpected_error",
        }
    }

    /// Returns `true` for reasons caused by the proof itself rather than the
    /// gateway or the chain.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Self::ConfigurationError | Self::RelayFailed | Self::UnexpectedError
        )
    }
}

impl core::fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for converting errors into structured payment problems.
pub trait AsPaymentProblem {
    /// Converts this error into a [`PaymentProblem`].
    fn as_payment_problem(&self) -> PaymentProblem;
}

/// A structured payment error with reason code and details.
#[derive(Debug)]
pub struct PaymentProblem {
    reason: ErrorReason,
    details: String,
}

impl PaymentProblem {
    /// Creates a new payment problem with the given reason and details.
    #[must_use]
    pub const fn new(reason: ErrorReason, details: String) -> Self {
        Self { reason, details }
    }

    /// Returns the error reason code.
    #[must_use]
    pub const fn reason(&self) -> ErrorReason {
        self.reason
    }

    /// Returns the human-readable error details.
    #[must_use]
    pub fn details(&self) -> &str {
        &self.details
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_version_message() {
        let err = PaymentVerificationError::UnsupportedVersion(Some(2));
        assert_eq!(err.to_string(), "Unsupported x402Version: 2, expected 1");
        let err = PaymentVerificationError::UnsupportedVersion(None);
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_reason_codes_serialize_snake_case() {
        let json = serde_json::to_string(&ErrorReason::AuthorizationNotYetValid).unwrap();
        assert_eq!(json, "\"authorization_not_yet_valid\"");
        assert_eq!(
            ErrorReason::AuthorizationNotYetValid.as_str(),
            "authorization_not_yet_valid"
        );
    }

    #[test]
    fn test_problem_carries_reason() {
        let problem = PaymentVerificationError::MissingField("payload.signature").as_payment_problem();
        assert_eq!(problem.reason(), ErrorReason::MissingField);
        assert!(problem.details().contains("payload.signature"));
        assert!(problem.reason().is_client_error());
        assert!(!ErrorReason::RelayFailed.is_client_error());
    }
}
