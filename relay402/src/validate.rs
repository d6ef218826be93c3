//! Protocol and temporal validation of payment proofs.
//!
//! [`ProtocolValidator`] turns a decoded [`PaymentProofDocument`] into a typed
//! [`PaymentProof`], checking, in order and stopping at the first failure:
//!
//! 1. `x402Version` is `1`
//! 2. `scheme` is `exact` (case-insensitive)
//! 3. `network` is the network this gateway serves (case-insensitive)
//! 4. every required field is present
//! 5. every field parses into its strict type
//!
//! [`assert_time`] checks the authorization's validity window against a
//! caller-supplied clock.

use alloy_primitives::{B256, Bytes, U256};

use crate::proto::{
    Authorization, AuthorizationDocument, EXACT_SCHEME, ExactPayloadDocument, PaymentProof,
    PaymentProofDocument, PaymentVerificationError, X402Version1, parse_address,
};
use crate::timestamp::UnixTimestamp;

/// Checks protocol constraints for one configured network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolValidator {
    network: String,
}

impl ProtocolValidator {
    /// Creates a validator accepting proofs for `network`.
    #[must_use]
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
        }
    }

    /// Returns the network name this validator accepts.
    #[must_use]
    pub fn network(&self) -> &str {
        &self.network
    }

    /// Validates a decoded document and converts it into a [`PaymentProof`].
    ///
    /// # Errors
    ///
    /// Returns the first [`PaymentVerificationError`] encountered: version,
    /// scheme or network mismatch, then a missing field, then a malformed
    /// field.
    pub fn validate(
        &self,
        document: &PaymentProofDocument,
    ) -> Result<PaymentProof, PaymentVerificationError> {
        let result = self.check(document);
        #[cfg(feature = "telemetry")]
        if let Err(error) = &result {
            tracing::debug!(%error, "payment proof rejected by protocol validator");
        }
        result
    }

    fn check(
        &self,
        document: &PaymentProofDocument,
    ) -> Result<PaymentProof, PaymentVerificationError> {
        match document.x402_version {
            Some(v) if X402Version1::matches(v) => {}
            other => return Err(PaymentVerificationError::UnsupportedVersion(other)),
        }

        let scheme = document.scheme.as_deref().unwrap_or_default();
        if !scheme.eq_ignore_ascii_case(EXACT_SCHEME) {
            return Err(PaymentVerificationError::UnsupportedScheme(scheme.to_owned()));
        }

        let network = document.network.as_deref().unwrap_or_default();
        if !network.eq_ignore_ascii_case(&self.network) {
            return Err(PaymentVerificationError::NetworkMismatch {
                expected: self.network.clone(),
                actual: network.to_owned(),
            });
        }

        let (signature, authorization) = required_fields(document.payload.as_ref())?;

        let signature = signature.trim().parse::<Bytes>().map_err(|e| {
            PaymentVerificationError::MalformedProof(format!("payload.signature: {e}"))
        })?;

        Ok(PaymentProof {
            x402_version: X402Version1::default(),
            network: network.to_owned(),
            signature,
            authorization,
        })
    }
}

/// Pulls out the signature and authorization, reporting the first absent field.
fn required_fields(
    payload: Option<&ExactPayloadDocument>,
) -> Result<(&str, Authorization), PaymentVerificationError> {
    use PaymentVerificationError::MissingField;

    let payload = payload.ok_or(MissingField("payload"))?;
    let signature = payload
        .signature
        .as_deref()
        .ok_or(MissingField("payload.signature"))?;
    let auth: &AuthorizationDocument = payload
        .authorization
        .as_ref()
        .ok_or(MissingField("payload.authorization"))?;

    let from = auth
        .from
        .as_deref()
        .ok_or(MissingField("payload.authorization.from"))?;
    let to = auth
        .to
        .as_deref()
        .ok_or(MissingField("payload.authorization.to"))?;
    let value = auth
        .value
        .as_ref()
        .ok_or(MissingField("payload.authorization.value"))?;
    let valid_after = auth
        .valid_after
        .as_ref()
        .ok_or(MissingField("payload.authorization.validAfter"))?;
    let valid_before = auth
        .valid_before
        .as_ref()
        .ok_or(MissingField("payload.authorization.validBefore"))?;
    let nonce = auth
        .nonce
        .as_deref()
        .ok_or(MissingField("payload.authorization.nonce"))?;

    let authorization = Authorization {
        from: parse_address("payload.authorization.from", from)?,
        to: parse_address("payload.authorization.to", to)?,
        value: value.to_u256("payload.authorization.value")?,
        valid_after: valid_after.to_u256("payload.authorization.validAfter")?,
        valid_before: valid_before.to_u256("payload.authorization.validBefore")?,
        nonce: nonce.trim().parse::<B256>().map_err(|_| {
            PaymentVerificationError::MalformedProof(
                "payload.authorization.nonce must be a 32-byte hex string".to_owned(),
            )
        })?,
    };
    Ok((signature, authorization))
}

/// Checks that `now` falls inside the authorization's validity window.
///
/// The window is `[validAfter, validBefore)`; a `validAfter` of zero means
/// there is no lower bound. No clock skew allowance is applied.
///
/// # Errors
///
/// Returns [`PaymentVerificationError::Expired`] if `now >= validBefore`, or
/// [`PaymentVerificationError::Early`] if `validAfter` is non-zero and later
/// than `now`.
pub fn assert_time(
    valid_after: U256,
    valid_before: U256,
    now: UnixTimestamp,
) -> Result<(), PaymentVerificationError> {
    let now = now.as_u256();
    if now >= valid_before {
        return Err(PaymentVerificationError::Expired);
    }
    if !valid_after.is_zero() && valid_after > now {
        return Err(PaymentVerificationError::Early);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::DecimalValue;

    const NONCE: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";

    fn document() -> PaymentProofDocument {
        PaymentProofDocument {
            x402_version: Some(1),
            scheme: Some("exact".to_owned()),
            network: Some("base".to_owned()),
            payload: Some(ExactPayloadDocument {
                signature: Some(format!("0x{}", "ab".repeat(65))),
                authorization: Some(AuthorizationDocument {
                    from: Some("0x857b06519e91e3a54538791bdbb0e22373e36b66".to_owned()),
                    to: Some("0x97311349bb9f5abe89bac32cb74a3ea7483ffe43".to_owned()),
                    value: Some(DecimalValue::Text("1000000".to_owned())),
                    valid_after: Some(DecimalValue::Number(0)),
                    valid_before: Some(DecimalValue::Text("1900000000".to_owned())),
                    nonce: Some(NONCE.to_owned()),
                }),
            }),
        }
    }

    fn authorization(doc: &mut PaymentProofDocument) -> &mut AuthorizationDocument {
        doc.payload.as_mut().unwrap().authorization.as_mut().unwrap()
    }

    #[test]
    fn test_valid_document() {
        let proof = ProtocolValidator::new("base").validate(&document()).unwrap();
        assert_eq!(proof.signature.len(), 65);
        assert_eq!(proof.authorization.value, U256::from(1_000_000u64));
        assert_eq!(proof.authorization.valid_after, U256::ZERO);
        assert_eq!(proof.authorization.nonce, NONCE.parse::<B256>().unwrap());
    }

    #[test]
    fn test_version_two_is_rejected() {
        let mut doc = document();
        doc.x402_version = Some(2);
        let err = ProtocolValidator::new("base").validate(&doc).unwrap_err();
        assert!(matches!(err, PaymentVerificationError::UnsupportedVersion(Some(2))));
    }

    #[test]
    fn test_missing_version_is_rejected() {
        let mut doc = document();
        doc.x402_version = None;
        let err = ProtocolValidator::new("base").validate(&doc).unwrap_err();
        assert!(matches!(err, PaymentVerificationError::UnsupportedVersion(None)));
    }

    #[test]
    fn test_scheme_and_network_are_case_insensitive() {
        let mut doc = document();
        doc.scheme = Some("EXACT".to_owned());
        doc.network = Some("Base".to_owned());
        assert!(ProtocolValidator::new("base").validate(&doc).is_ok());
    }

    #[test]
    fn test_wrong_scheme_and_network() {
        let mut doc = document();
        doc.scheme = Some("upto".to_owned());
        let err = ProtocolValidator::new("base").validate(&doc).unwrap_err();
        assert!(matches!(err, PaymentVerificationError::UnsupportedScheme(_)));

        let err = ProtocolValidator::new("base-sepolia")
            .validate(&document())
            .unwrap_err();
        assert!(matches!(
            err,
            PaymentVerificationError::NetworkMismatch { .. }
        ));
    }

    #[test]
    fn test_version_is_checked_before_fields() {
        let doc = PaymentProofDocument {
            x402_version: Some(2),
            ..PaymentProofDocument::default()
        };
        let err = ProtocolValidator::new("base").validate(&doc).unwrap_err();
        assert!(matches!(err, PaymentVerificationError::UnsupportedVersion(_)));
    }

    #[test]
    fn test_missing_nonce_is_named() {
        let mut doc = document();
        authorization(&mut doc).nonce = None;
        let err = ProtocolValidator::new("base").validate(&doc).unwrap_err();
        assert!(matches!(
            err,
            PaymentVerificationError::MissingField("payload.authorization.nonce")
        ));
    }

    #[test]
    fn test_missing_signature_reported_first() {
        let mut doc = document();
        doc.payload.as_mut().unwrap().signature = None;
        authorization(&mut doc).from = None;
        let err = ProtocolValidator::new("base").validate(&doc).unwrap_err();
        assert!(matches!(
            err,
            PaymentVerificationError::MissingField("payload.signature")
        ));
    }

    #[test]
    fn test_zero_is_present() {
        let mut doc = document();
        authorization(&mut doc).valid_after = Some(DecimalValue::Text("0".to_owned()));
        authorization(&mut doc).value = Some(DecimalValue::Number(0));
        assert!(ProtocolValidator::new("base").validate(&doc).is_ok());
    }

    #[test]
    fn test_short_nonce_is_malformed() {
        let mut doc = document();
        authorization(&mut doc).nonce = Some("0x1234".to_owned());
        let err = ProtocolValidator::new("base").validate(&doc).unwrap_err();
        assert!(matches!(err, PaymentVerificationError::MalformedProof(_)));
    }

    #[test]
    fn test_non_hex_signature_is_malformed() {
        let mut doc = document();
        doc.payload.as_mut().unwrap().signature = Some("0xzz".to_owned());
        let err = ProtocolValidator::new("base").validate(&doc).unwrap_err();
        assert!(err.to_string().contains("payload.signature"));
    }

    #[test]
    fn test_expired_at_boundary() {
        let now = UnixTimestamp::from_secs(1_000);
        let err = assert_time(U256::ZERO, U256::from(1_000u64), now).unwrap_err();
        assert!(matches!(err, PaymentVerificationError::Expired));
        let err = assert_time(U256::ZERO, U256::from(999u64), now).unwrap_err();
        assert!(matches!(err, PaymentVerificationError::Expired));
        assert!(assert_time(U256::ZERO, U256::from(1_001u64), now).is_ok());
    }

    #[test]
    fn test_not_yet_valid() {
        let now = UnixTimestamp::from_secs(1_000);
        let err = assert_time(U256::from(1_001u64), U256::from(2_000u64), now).unwrap_err();
        assert!(matches!(err, PaymentVerificationError::Early));
        assert!(assert_time(U256::from(1_000u64), U256::from(2_000u64), now).is_ok());
    }

    #[test]
    fn test_zero_valid_after_has_no_lower_bound() {
        for now in [0u64, 1, 1_000, u64::MAX - 1] {
            let result = assert_time(U256::ZERO, U256::MAX, UnixTimestamp::from_secs(now));
            assert!(result.is_ok());
        }
    }

    #[test]
    fn test_expiry_checked_before_lower_bound() {
        let now = UnixTimestamp::from_secs(1_000);
        let err = assert_time(U256::from(5_000u64), U256::from(10u64), now).unwrap_err();
        assert!(matches!(err, PaymentVerificationError::Expired));
    }
}
