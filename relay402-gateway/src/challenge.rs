//! The HTTP 402 challenge.
//!
//! A request without a payment header is answered with a [`PaymentRequired`]
//! body describing the single `exact` payment this gateway accepts.

use alloy_primitives::Address;
use relay402::proto::{EXACT_SCHEME, PaymentRequired, PaymentRequirements, X402Version1};
use serde_json::json;

/// Human-readable reason sent with every challenge.
pub const PAYMENT_REQUIRED_MESSAGE: &str = "Payment required to access this resource";

/// Terms advertised to clients that have not paid yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentChallenge {
    /// x402 network name.
    pub network: String,
    /// Token contract address.
    pub asset: Address,
    /// Token EIP-712 domain name.
    pub asset_name: String,
    /// Token EIP-712 domain version.
    pub asset_version: String,
    /// Payment recipient.
    pub pay_to: Address,
    /// Price in token base units.
    pub max_amount_required: String,
    /// Fixed resource URL; the request URL is used when unset.
    pub resource: Option<String>,
    /// Resource description.
    pub description: String,
    /// How long a signed payment should stay valid.
    pub max_timeout_seconds: u64,
    /// Facilitator URL clients may settle through instead.
    pub facilitator: Option<String>,
}

impl PaymentChallenge {
    /// Builds the 402 body for a request to `request_url`.
    #[must_use]
    pub fn payment_required(&self, request_url: &str) -> PaymentRequired {
        let resource = self
            .resource
            .clone()
            .unwrap_or_else(|| request_url.to_owned());
        let requirements = PaymentRequirements {
            scheme: EXACT_SCHEME.to_owned(),
            network: self.network.clone(),
            max_amount_required: self.max_amount_required.clone(),
            resource,
            description: self.description.clone(),
            mime_type: "application/json".to_owned(),
            output_schema: Some(json!({
                "input": { "type": "http", "method": "GET", "discoverable": true },
            })),
            pay_to: self.pay_to.to_checksum(None),
            max_timeout_seconds: self.max_timeout_seconds,
            asset: self.asset.to_checksum(None),
            extra: Some(json!({
                "recipientAddress": self.pay_to.to_checksum(None),
                "name": self.asset_name,
                "version": self.asset_version,
                "primaryType": "TransferWithAuthorization",
            })),
        };
        PaymentRequired {
            x402_version: X402Version1::default(),
            error: Some(PAYMENT_REQUIRED_MESSAGE.to_owned()),
            accepts: vec![requirements],
            facilitator: self.facilitator.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;
    use relay402_evm::USDC_BASE;

    use super::*;

    fn challenge() -> PaymentChallenge {
        PaymentChallenge {
            network: "base".to_owned(),
            asset: USDC_BASE,
            asset_name: "USD Coin".to_owned(),
            asset_version: "2".to_owned(),
            pay_to: address!("97311349bB9f5aBE89BaC32cb74a3EA7483Ffe43"),
            max_amount_required: "1000000".to_owned(),
            resource: None,
            description: "Paid weather report".to_owned(),
            max_timeout_seconds: 300,
            facilitator: Some("https://facilitator.thirdweb.com".to_owned()),
        }
    }

    #[test]
    fn test_challenge_body_shape() {
        let body = serde_json::to_value(challenge().payment_required("http://localhost/")).unwrap();

        assert_eq!(body["x402Version"], 1);
        assert_eq!(body["error"], PAYMENT_REQUIRED_MESSAGE);
        assert_eq!(body["facilitator"], "https://facilitator.thirdweb.com");
        let accepts = body["accepts"].as_array().unwrap();
        assert_eq!(accepts.len(), 1);
        let requirement = &accepts[0];
        assert_eq!(requirement["scheme"], "exact");
        assert_eq!(requirement["network"], "base");
        assert_eq!(requirement["maxAmountRequired"], "1000000");
        assert_eq!(requirement["mimeType"], "application/json");
        assert_eq!(requirement["maxTimeoutSeconds"], 300);
        assert_eq!(requirement["asset"], "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");
        assert!(
            requirement["payTo"]
                .as_str()
                .unwrap()
                .eq_ignore_ascii_case("0x97311349bb9f5abe89bac32cb74a3ea7483ffe43")
        );
        assert_eq!(requirement["outputSchema"]["input"]["method"], "GET");
        assert_eq!(requirement["outputSchema"]["input"]["discoverable"], true);
        assert_eq!(requirement["extra"]["name"], "USD Coin");
        assert_eq!(requirement["extra"]["version"], "2");
        assert_eq!(requirement["extra"]["primaryType"], "TransferWithAuthorization");
    }

    #[test]
    fn test_resource_falls_back_to_request_url() {
        let body = challenge().payment_required("http://gateway.local/");
        assert_eq!(body.accepts[0].resource, "http://gateway.local/");

        let fixed = PaymentChallenge {
            resource: Some("https://paid.example/".to_owned()),
            ..challenge()
        };
        let body = fixed.payment_required("http://gateway.local/");
        assert_eq!(body.accepts[0].resource, "https://paid.example/");
    }

    #[test]
    fn test_facilitator_is_optional() {
        let without = PaymentChallenge {
            facilitator: None,
            ..challenge()
        };
        let body = serde_json::to_value(without.payment_required("http://localhost/")).unwrap();
        assert!(body.get("facilitator").is_none());
    }
}
