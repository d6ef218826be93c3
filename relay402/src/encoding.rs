//! Base64url decoding of the payment proof header.
//!
//! Clients send the payment proof as base64url-encoded JSON, usually with the
//! trailing `=` padding stripped. The decoder maps the URL-safe alphabet back
//! to the standard one and restores padding from the input length before
//! decoding:
//!
//! | `len % 4` | padding appended |
//! |-----------|------------------|
//! | 0         | none             |
//! | 2         | `==`             |
//! | 3         | `=`              |
//! | 1         | rejected         |

use base64::Engine;
use base64::engine::general_purpose::{STANDARD as b64, URL_SAFE_NO_PAD as b64url};

use crate::proto::{PaymentProofDocument, PaymentVerificationError};

/// Decodes a base64url string (padded or not) into raw bytes.
///
/// Standard-alphabet input is accepted as well, since the alphabet mapping is a
/// no-op for it.
///
/// # Errors
///
/// Returns [`PaymentVerificationError::MalformedProof`] if the length leaves a
/// remainder of 1 modulo 4 or the data is not valid base64.
pub fn decode_base64url(input: &str) -> Result<Vec<u8>, PaymentVerificationError> {
    let mut standard: String = input
        .trim()
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    match standard.len() % 4 {
        0 => {}
        2 => standard.push_str("=="),
        3 => standard.push('='),
        _ => {
            return Err(PaymentVerificationError::MalformedProof(
                "payment header has an invalid base64url length".to_owned(),
            ));
        }
    }
    b64.decode(standard.as_bytes()).map_err(|e| {
        PaymentVerificationError::MalformedProof(format!("payment header is not valid base64: {e}"))
    })
}

/// Encodes bytes as unpadded base64url, the form clients put in the header.
#[must_use]
pub fn encode_base64url<T: AsRef<[u8]>>(input: T) -> String {
    b64url.encode(input.as_ref())
}

/// Decodes a payment header value into a [`PaymentProofDocument`].
///
/// The header is base64url-decoded, interpreted as UTF-8 and parsed as JSON.
/// Field presence is not checked here; that is the job of
/// [`ProtocolValidator`](crate::validate::ProtocolValidator).
///
/// # Errors
///
/// Returns [`PaymentVerificationError::MalformedProof`] naming the step that
/// failed.
pub fn decode_payment_header(value: &str) -> Result<PaymentProofDocument, PaymentVerificationError> {
    let bytes = decode_base64url(value)?;
    let text = std::str::from_utf8(&bytes).map_err(|e| {
        PaymentVerificationError::MalformedProof(format!("payment header is not UTF-8: {e}"))
    })?;
    serde_json::from_str(text).map_err(|e| {
        PaymentVerificationError::MalformedProof(format!("payment header is not valid JSON: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_padding(s: &str) -> &str {
        s.trim_end_matches('=')
    }

    #[test]
    fn test_restores_two_padding_chars() {
        // 1 byte -> 4 chars padded, 2 unpadded
        let encoded = strip_padding(&b64.encode(b"{")).to_owned();
        assert_eq!(encoded.len() % 4, 2);
        assert_eq!(decode_base64url(&encoded).unwrap(), b"{");
    }

    #[test]
    fn test_restores_one_padding_char() {
        let encoded = strip_padding(&b64.encode(b"{}")).to_owned();
        assert_eq!(encoded.len() % 4, 3);
        assert_eq!(decode_base64url(&encoded).unwrap(), b"{}");
    }

    #[test]
    fn test_no_padding_needed() {
        let encoded = b64.encode(b"[1]");
        assert_eq!(encoded.len() % 4, 0);
        assert!(!encoded.ends_with('='));
        assert_eq!(decode_base64url(&encoded).unwrap(), b"[1]");
    }

    #[test]
    fn test_remainder_one_is_rejected() {
        for input in ["A", "AAAAA", "eyJhIjoxfQA"] {
            let input = &input[..input.len() - (input.len() % 4) + 1];
            assert_eq!(input.len() % 4, 1);
            let err = decode_base64url(input).unwrap_err();
            assert!(matches!(err, PaymentVerificationError::MalformedProof(_)));
        }
    }

    #[test]
    fn test_url_safe_alphabet_is_mapped() {
        let raw = [0xfb_u8, 0xff, 0xbf];
        let encoded = encode_base64url(raw);
        assert!(encoded.contains('-') || encoded.contains('_'));
        assert_eq!(decode_base64url(&encoded).unwrap(), raw);
    }

    #[test]
    fn test_decoded_bytes_match_original_json() {
        let json = r#"{"x402Version":1,"scheme":"exact","network":"base","payload":{}}"#;
        for trim in 0..3 {
            let text = &json[..json.len() - trim];
            let encoded = encode_base64url(text);
            assert_eq!(decode_base64url(&encoded).unwrap(), text.as_bytes());
        }
    }

    #[test]
    fn test_header_decodes_into_document() {
        let json = r#"{"x402Version":1,"scheme":"exact","network":"base"}"#;
        let doc = decode_payment_header(&encode_base64url(json)).unwrap();
        assert_eq!(doc.x402_version, Some(1));
        assert_eq!(doc.scheme.as_deref(), Some("exact"));
        assert!(doc.payload.is_none());
    }

    #[test]
    fn test_non_json_header_is_malformed() {
        let err = decode_payment_header(&encode_base64url("not json")).unwrap_err();
        assert!(err.to_string().contains("JSON"));
        let err = decode_payment_header(&encode_base64url([0xff_u8, 0xfe])).unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
    }
}
