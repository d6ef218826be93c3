//! Signer recovery for EIP-3009 authorizations.
//!
//! Only externally owned accounts can sign a `transferWithAuthorization` that
//! this gateway relays, so verification is plain ECDSA recovery: 65-byte
//! `r‖s‖v` signatures and 64-byte ERC-2098 compact signatures are accepted.

use alloy_primitives::{Address, B256, Signature};
use relay402::proto::{Authorization, PaymentVerificationError};

/// Parses raw signature bytes, normalizing `s` to the lower half of the curve order.
///
/// Returns `None` for any length other than 64 or 65, or an invalid `v`.
#[must_use]
pub fn parse_signature(bytes: &[u8]) -> Option<Signature> {
    match bytes.len() {
        65 => Signature::from_raw(bytes).ok().map(Signature::normalized_s),
        64 => Some(Signature::from_erc2098(bytes).normalized_s()),
        _ => None,
    }
}

/// Recovers the signer of `hash` and checks it is the authorization's payer.
///
/// On success returns the normalized signature, ready to be split into
/// `(v, r, s)` for submission.
///
/// # Errors
///
/// Returns [`PaymentVerificationError::InvalidSignature`] if the bytes are not
/// a recoverable signature or recover to an address other than `from`. The
/// recovered address is carried when recovery itself succeeded.
pub fn verify_signature(
    authorization: &Authorization,
    signature: &[u8],
    hash: &B256,
) -> Result<Signature, PaymentVerificationError> {
    let invalid = |recovered: Option<Address>| PaymentVerificationError::InvalidSignature {
        expected: authorization.from,
        recovered,
    };
    let signature = parse_signature(signature).ok_or_else(|| invalid(None))?;
    let recovered = signature
        .recover_address_from_prehash(hash)
        .map_err(|_| invalid(None))?;
    if recovered == authorization.from {
        Ok(signature)
    } else {
        Err(invalid(Some(recovered)))
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::U256;
    use alloy_signer::SignerSync;
    use alloy_signer_local::PrivateKeySigner;

    use super::*;

    fn signed() -> (Authorization, B256, Vec<u8>) {
        let signer = PrivateKeySigner::random();
        let authorization = Authorization {
            from: signer.address(),
            to: Address::repeat_byte(0x02),
            value: U256::from(1_000_000u64),
            valid_after: U256::ZERO,
            valid_before: U256::from(1_900_000_000u64),
            nonce: B256::repeat_byte(0x03),
        };
        let hash = B256::repeat_byte(0x42);
        let signature = signer.sign_hash_sync(&hash).unwrap();
        (authorization, hash, signature.as_bytes().to_vec())
    }

    #[test]
    fn test_valid_signature_recovers_payer() {
        let (authorization, hash, bytes) = signed();
        let signature = verify_signature(&authorization, &bytes, &hash).unwrap();
        assert_eq!(
            signature.recover_address_from_prehash(&hash).unwrap(),
            authorization.from
        );
    }

    #[test]
    fn test_compact_signature_is_accepted() {
        let (authorization, hash, bytes) = signed();
        let compact = parse_signature(&bytes).unwrap().as_erc2098();
        assert!(verify_signature(&authorization, &compact, &hash).is_ok());
    }

    #[test]
    fn test_flipping_any_byte_rejects() {
        let (authorization, hash, bytes) = signed();
        for index in 0..bytes.len() {
            let mut tampered = bytes.clone();
            tampered[index] ^= 0x01;
            let result = verify_signature(&authorization, &tampered, &hash);
            assert!(
                matches!(result, Err(PaymentVerificationError::InvalidSignature { .. })),
                "byte {index} flip was accepted"
            );
        }
    }

    #[test]
    fn test_wrong_signer_reports_recovered_address() {
        let (mut authorization, hash, bytes) = signed();
        let actual_signer = authorization.from;
        authorization.from = Address::repeat_byte(0x07);
        let err = verify_signature(&authorization, &bytes, &hash).unwrap_err();
        match err {
            PaymentVerificationError::InvalidSignature {
                expected,
                recovered,
            } => {
                assert_eq!(expected, Address::repeat_byte(0x07));
                assert_eq!(recovered, Some(actual_signer));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_wrong_length_is_unrecoverable() {
        let (authorization, hash, bytes) = signed();
        let err = verify_signature(&authorization, &bytes[..63], &hash).unwrap_err();
        assert!(matches!(
            err,
            PaymentVerificationError::InvalidSignature {
                recovered: None,
                ..
            }
        ));
    }
}
