//! Payment proof payloads: the raw header document and its validated form.

use alloy_primitives::{Address, B256, Bytes, U256};
use serde::{Deserialize, Serialize};

use super::{PaymentVerificationError, X402Version1};

/// The payment proof exactly as decoded from the header.
///
/// Every field is optional so that a missing field is reported by name
/// instead of as a generic JSON error. A JSON `null` counts as missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentProofDocument {
    /// Protocol version; must be `1`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x402_version: Option<u64>,
    /// Payment scheme; must be `exact`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    /// Network name, e.g. `base`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    /// The signed authorization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<ExactPayloadDocument>,
}

/// The `payload` object of an `exact` payment proof.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExactPayloadDocument {
    /// Hex-encoded ECDSA signature over the EIP-712 message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// The `transferWithAuthorization` parameters that were signed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<AuthorizationDocument>,
}

/// The `payload.authorization` object as sent by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationDocument {
    /// Payer address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Payee address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Amount in the token's smallest unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<DecimalValue>,
    /// Lower validity bound in Unix seconds; `0` means none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_after: Option<DecimalValue>,
    /// Upper validity bound in Unix seconds (exclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_before: Option<DecimalValue>,
    /// 32-byte authorization nonce, hex encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

/// An unsigned integer field that may arrive as a decimal string or a JSON number.
///
/// Strings are the canonical form since amounts routinely exceed what a
/// JSON number can carry without loss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DecimalValue {
    /// `"1000000"`
    Text(String),
    /// `1000000`
    Number(u64),
}

impl DecimalValue {
    /// Parses the value into a [`U256`] without truncation.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentVerificationError::MalformedProof`] naming `field` if
    /// the text is not a base-10 unsigned integer that fits in 256 bits.
    pub fn to_u256(&self, field: &str) -> Result<U256, PaymentVerificationError> {
        match self {
            Self::Number(n) => Ok(U256::from(*n)),
            Self::Text(text) => {
                let text = text.trim();
                if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(PaymentVerificationError::MalformedProof(format!(
                        "{field} must be a decimal integer"
                    )));
                }
                U256::from_str_radix(text, 10).map_err(|_| {
                    PaymentVerificationError::MalformedProof(format!("{field} overflows uint256"))
                })
            }
        }
    }
}

impl From<U256> for DecimalValue {
    fn from(value: U256) -> Self {
        Self::Text(value.to_string())
    }
}

/// A validated EIP-3009 authorization.
///
/// Addresses are parsed (and checksum-verified when given in mixed case),
/// integers are full 256-bit values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authorization {
    /// Payer; the address that must have produced the signature.
    pub from: Address,
    /// Payee.
    pub to: Address,
    /// Amount in the token's smallest unit.
    pub value: U256,
    /// Lower validity bound in Unix seconds; zero means none.
    pub valid_after: U256,
    /// Upper validity bound in Unix seconds (exclusive).
    pub valid_before: U256,
    /// Unique authorization nonce.
    pub nonce: B256,
}

/// A fully validated payment proof. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentProof {
    /// Protocol version marker.
    pub x402_version: X402Version1,
    /// Network name as sent by the client.
    pub network: String,
    /// Raw signature bytes, 65 (`r‖s‖v`) or 64 (ERC-2098) long when well formed.
    pub signature: Bytes,
    /// The signed authorization.
    pub authorization: Authorization,
}

/// Parses an address, verifying the EIP-55 checksum when the input is mixed case.
///
/// # Errors
///
/// Returns [`PaymentVerificationError::MalformedProof`] naming `field`.
pub fn parse_address(field: &str, input: &str) -> Result<Address, PaymentVerificationError> {
    let input = input.trim();
    let digits = input.strip_prefix("0x").unwrap_or(input);
    let mixed_case = digits.bytes().any(|b| b.is_ascii_lowercase())
        && digits.bytes().any(|b| b.is_ascii_uppercase());
    let parsed = if mixed_case {
        Address::parse_checksummed(input, None).map_err(|e| e.to_string())
    } else {
        input.parse::<Address>().map_err(|e| e.to_string())
    };
    parsed.map_err(|e| PaymentVerificationError::MalformedProof(format!("{field}: {e}")))
}
