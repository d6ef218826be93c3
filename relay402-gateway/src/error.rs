//! HTTP responses for failed payment requests.
//!
//! Client faults (anything a [`PaymentVerificationError`] describes) answer
//! `400 {error, code}`, plus `recovered` for a signature from the wrong
//! signer. Everything else answers `500 {error, code, reason}`.

use alloy_primitives::{Address, TxHash};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use relay402::proto::{AsPaymentProblem, ErrorReason, PaymentVerificationError};
use relay402_evm::exact::RelayError;
use serde::Serialize;

/// Errors surfaced by the gateway's paid route.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The relay pipeline rejected or failed the payment.
    #[error(transparent)]
    Relay(#[from] RelayError),
}

impl From<PaymentVerificationError> for GatewayError {
    fn from(e: PaymentVerificationError) -> Self {
        Self::Relay(RelayError::Verification(e))
    }
}

/// JSON body of an error response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    code: ErrorReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    recovered: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tx_hash: Option<TxHash>,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let Self::Relay(err) = self;
        let problem = err.as_payment_problem();
        let code = problem.reason();

        let (status, body) = match &err {
            RelayError::Verification(verification) => {
                tracing::info!(%code, error = %verification, "Payment proof rejected");
                let recovered = match verification {
                    PaymentVerificationError::InvalidSignature { recovered, .. } => *recovered,
                    _ => None,
                };
                let body = ErrorBody {
                    error: verification.to_string(),
                    code,
                    recovered,
                    reason: None,
                    tx_hash: None,
                };
                (StatusCode::BAD_REQUEST, body)
            }
            other => {
                tracing::error!(%code, error = %other, "Payment relay failed");
                let tx_hash = match other {
                    RelayError::RelayFailed { transaction, .. } => *transaction,
                    _ => None,
                };
                let body = ErrorBody {
                    error: other.to_string(),
                    code,
                    recovered: None,
                    reason: Some(other.reason()),
                    tx_hash,
                };
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use relay402_evm::relayer::RelayerPoolError;
    use serde_json::Value;

    use super::*;

    async fn render(err: impl Into<GatewayError>) -> (StatusCode, Value) {
        let response = err.into().into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_verification_error_is_bad_request() {
        let (status, body) = render(PaymentVerificationError::MissingField(
            "payload.authorization.nonce",
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "missing_field");
        assert!(body["error"].as_str().unwrap().contains("payload.authorization.nonce"));
        assert!(body.get("reason").is_none());
    }

    #[tokio::test]
    async fn test_wrong_signer_reports_recovered() {
        let recovered = Address::repeat_byte(0x11);
        let (status, body) = render(PaymentVerificationError::InvalidSignature {
            expected: Address::repeat_byte(0x22),
            recovered: Some(recovered),
        })
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_signature");
        assert_eq!(body["recovered"], recovered.to_string());
    }

    #[tokio::test]
    async fn test_revert_is_server_error_with_reason() {
        let tx = TxHash::repeat_byte(0xab);
        let (status, body) = render(RelayError::reverted(tx)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "relay_failed");
        assert!(body["reason"].as_str().unwrap().contains("reverted"));
        assert_eq!(body["txHash"], tx.to_string());
    }

    #[tokio::test]
    async fn test_empty_pool_is_configuration_error() {
        let (status, body) = render(RelayError::from(RelayerPoolError::Empty)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "configuration_error");
        assert_eq!(body["reason"], "no relayer keys configured");
    }

    #[tokio::test]
    async fn test_internal_error() {
        let (status, body) = render(RelayError::Internal("name() did not answer".to_owned())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "unexpected_error");
        assert_eq!(body["reason"], "name() did not answer");
    }
}
