//! EIP-712 typed data reconstruction.
//!
//! The payer signed a `TransferWithAuthorization` message under the token's
//! EIP-712 domain. To verify the signature the gateway has to rebuild both
//! exactly: the domain from its own configuration plus the token's live
//! `name()`, the message from the proof's authorization fields.

use alloy_primitives::{Address, B256};
use alloy_sol_types::{Eip712Domain, SolStruct, eip712_domain};
use relay402::proto::Authorization;

use super::TransferWithAuthorization;

/// The statically known part of the token's EIP-712 domain.
///
/// The domain `name` is deliberately absent: it is read from the contract on
/// every request so that a renamed token is never verified against a stale
/// value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDomain {
    /// Domain `version` (`"2"` for USDC).
    pub version: String,
    /// EIP-155 chain ID of the configured network.
    pub chain_id: u64,
    /// The token contract.
    pub verifying_contract: Address,
}

impl AssetDomain {
    /// Completes the domain with the token name fetched from the contract.
    #[must_use]
    pub fn with_name(&self, name: String) -> Eip712Domain {
        eip712_domain! {
            name: name,
            version: self.version.clone(),
            chain_id: self.chain_id,
            verifying_contract: self.verifying_contract,
        }
    }
}

/// Builds the message the payer signed from a validated authorization.
#[must_use]
pub const fn transfer_message(authorization: &Authorization) -> TransferWithAuthorization {
    TransferWithAuthorization {
        from: authorization.from,
        to: authorization.to,
        value: authorization.value,
        validAfter: authorization.valid_after,
        validBefore: authorization.valid_before,
        nonce: authorization.nonce,
    }
}

/// Returns the EIP-712 signing hash of `authorization` under `domain`.
#[must_use]
pub fn signing_hash(authorization: &Authorization, domain: &Eip712Domain) -> B256 {
    transfer_message(authorization).eip712_signing_hash(domain)
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{U256, keccak256};

    use super::*;
    use crate::USDC_BASE;

    fn authorization() -> Authorization {
        Authorization {
            from: Address::repeat_byte(0x01),
            to: Address::repeat_byte(0x02),
            value: U256::from(1_000_000u64),
            valid_after: U256::ZERO,
            valid_before: U256::from(1_900_000_000u64),
            nonce: B256::repeat_byte(0x03),
        }
    }

    fn base_usdc() -> AssetDomain {
        AssetDomain {
            version: "2".to_owned(),
            chain_id: 8453,
            verifying_contract: USDC_BASE,
        }
    }

    #[test]
    fn test_type_hash_matches_eip3009() {
        let expected = keccak256(
            "TransferWithAuthorization(address from,address to,uint256 value,uint256 validAfter,uint256 validBefore,bytes32 nonce)",
        );
        assert_eq!(transfer_message(&authorization()).eip712_type_hash(), expected);
    }

    #[test]
    fn test_domain_carries_all_fields() {
        let domain = base_usdc().with_name("USD Coin".to_owned());
        assert_eq!(domain.name.as_deref(), Some("USD Coin"));
        assert_eq!(domain.version.as_deref(), Some("2"));
        assert_eq!(domain.chain_id, Some(U256::from(8453u64)));
        assert_eq!(domain.verifying_contract, Some(USDC_BASE));
    }

    #[test]
    fn test_hash_depends_on_every_domain_field() {
        let auth = authorization();
        let reference = signing_hash(&auth, &base_usdc().with_name("USD Coin".to_owned()));

        let renamed = signing_hash(&auth, &base_usdc().with_name("USDC".to_owned()));
        let mut other_version = base_usdc();
        other_version.version = "1".to_owned();
        let mut other_chain = base_usdc();
        other_chain.chain_id = 84532;
        let mut other_contract = base_usdc();
        other_contract.verifying_contract = Address::repeat_byte(0x09);

        for domain in [other_version, other_chain, other_contract] {
            let hash = signing_hash(&auth, &domain.with_name("USD Coin".to_owned()));
            assert_ne!(hash, reference);
        }
        assert_ne!(renamed, reference);
    }

    #[test]
    fn test_hash_depends_on_message() {
        let domain = base_usdc().with_name("USD Coin".to_owned());
        let mut auth = authorization();
        let reference = signing_hash(&auth, &domain);
        auth.value += U256::from(1u64);
        assert_ne!(signing_hash(&auth, &domain), reference);
    }
}
