//! Errors of the relay pipeline.

use alloy_primitives::TxHash;
use relay402::proto::{AsPaymentProblem, ErrorReason, PaymentProblem, PaymentVerificationError};

use crate::chain::MetaTransactionSendError;
use crate::relayer::RelayerPoolError;

/// Why a payment proof could not be relayed.
///
/// [`Verification`](Self::Verification) errors are the client's fault and are
/// raised before anything touches the chain. The rest are the gateway's or the
/// chain's.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The proof was rejected by a verification stage.
    #[error(transparent)]
    Verification(#[from] PaymentVerificationError),
    /// No relayer could be selected.
    #[error("Configuration error: {0}")]
    Configuration(#[from] RelayerPoolError),
    /// The transfer was attempted and did not succeed.
    #[error("Relay failed: {reason}")]
    RelayFailed {
        /// Revert detail, RPC error or timeout description.
        reason: String,
        /// Hash of the mined transaction when the failure was a revert.
        transaction: Option<TxHash>,
    },
    /// A read against the asset contract failed before submission.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// A failed relay with no transaction on record.
    pub fn relay_failed(reason: impl Into<String>) -> Self {
        Self::RelayFailed {
            reason: reason.into(),
            transaction: None,
        }
    }

    /// A mined transaction whose receipt reports failure.
    #[must_use]
    pub fn reverted(transaction: TxHash) -> Self {
        Self::RelayFailed {
            reason: format!("transaction {transaction} reverted"),
            transaction: Some(transaction),
        }
    }

    /// Returns the detail a client should see in the `reason` field.
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            Self::RelayFailed { reason, .. } => reason.clone(),
            Self::Internal(reason) => reason.clone(),
            Self::Configuration(e) => e.to_string(),
            Self::Verification(e) => e.to_string(),
        }
    }
}

impl From<MetaTransactionSendError> for RelayError {
    fn from(e: MetaTransactionSendError) -> Self {
        Self::relay_failed(e.to_string())
    }
}

impl From<alloy_contract::Error> for RelayError {
    fn from(e: alloy_contract::Error) -> Self {
        Self::Internal(e.to_string())
    }
}

impl AsPaymentProblem for RelayError {
    fn as_payment_problem(&self) -> PaymentProblem {
        match self {
            Self::Verification(e) => e.as_payment_problem(),
            Self::Configuration(_) => {
                PaymentProblem::new(ErrorReason::ConfigurationError, self.to_string())
            }
            Self::RelayFailed { .. } => PaymentProblem::new(ErrorReason::RelayFailed, self.to_string()),
            Self::Internal(_) => PaymentProblem::new(ErrorReason::UnexpectedError, self.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverted_reason_names_transaction() {
        let hash = TxHash::repeat_byte(0xab);
        let err = RelayError::reverted(hash);
        assert!(err.reason().contains(&hash.to_string()));
        assert_eq!(err.as_payment_problem().reason(), ErrorReason::RelayFailed);
    }

    #[test]
    fn test_verification_keeps_client_reason() {
        let err = RelayError::from(PaymentVerificationError::Expired);
        let problem = err.as_payment_problem();
        assert_eq!(problem.reason(), ErrorReason::AuthorizationExpired);
        assert!(problem.reason().is_client_error());
    }

    #[test]
    fn test_empty_pool_is_configuration_error() {
        let err = RelayError::from(RelayerPoolError::Empty);
        assert_eq!(
            err.as_payment_problem().reason(),
            ErrorReason::ConfigurationError
        );
    }
}
