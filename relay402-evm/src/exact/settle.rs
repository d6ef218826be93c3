//! On-chain settlement of a verified authorization.
//!
//! The signature is split into its `(v, r, s)` components and submitted
//! through the matching `transferWithAuthorization` overload by the selected
//! relayer. One confirmation is awaited; a receipt with a failed status is a
//! relay failure, not a success.

use alloy_primitives::{B256, Bytes, Signature, TxHash};
use alloy_rpc_types_eth::TransactionReceipt;
use alloy_sol_types::SolCall;
use relay402::proto::Authorization;

use super::contract::IEIP3009;
use super::error::RelayError;
use crate::relayer::RelayerIdentity;

/// An authorization together with the verified, low-`s` signature of its payer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedTransfer {
    /// The authorization to execute.
    pub authorization: Authorization,
    /// The payer's signature, already checked against `authorization.from`.
    pub signature: Signature,
}

impl SignedTransfer {
    /// Builds the `transferWithAuthorization(…, v, r, s)` call.
    #[must_use]
    pub fn call(&self) -> IEIP3009::transferWithAuthorizationCall {
        let auth = &self.authorization;
        IEIP3009::transferWithAuthorizationCall {
            from: auth.from,
            to: auth.to,
            value: auth.value,
            validAfter: auth.valid_after,
            validBefore: auth.valid_before,
            nonce: auth.nonce,
            v: 27 + u8::from(self.signature.v()),
            r: B256::from(self.signature.r()),
            s: B256::from(self.signature.s()),
        }
    }

    /// ABI-encoded calldata for [`call`](Self::call).
    #[must_use]
    pub fn calldata(&self) -> Bytes {
        self.call().abi_encode().into()
    }
}

/// A transfer that was mined successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReceipt {
    /// Hash of the relay transaction.
    pub tx_hash: TxHash,
    /// Block the transaction was included in.
    pub block_number: Option<u64>,
    /// Relayer that paid for the transaction.
    pub relayer: RelayerIdentity,
}

impl TransferReceipt {
    /// Interprets a mined receipt.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::RelayFailed`] carrying the transaction hash if the
    /// receipt reports a revert.
    pub fn from_receipt(
        receipt: &TransactionReceipt,
        relayer: RelayerIdentity,
    ) -> Result<Self, RelayError> {
        if receipt.status() {
            Ok(Self {
                tx_hash: receipt.transaction_hash,
                block_number: receipt.block_number,
                relayer,
            })
        } else {
            Err(RelayError::reverted(receipt.transaction_hash))
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, U256};
    use alloy_signer::SignerSync;
    use alloy_signer_local::PrivateKeySigner;

    use super::*;

    #[test]
    fn test_call_splits_signature() {
        let signer = PrivateKeySigner::random();
        let hash = B256::repeat_byte(0x11);
        let signature = signer.sign_hash_sync(&hash).unwrap().normalized_s();
        let transfer = SignedTransfer {
            authorization: Authorization {
                from: signer.address(),
                to: Address::repeat_byte(0x02),
                value: U256::from(5u64),
                valid_after: U256::ZERO,
                valid_before: U256::from(10u64),
                nonce: B256::repeat_byte(0x03),
            },
            signature,
        };

        let calldata = transfer.calldata();
        assert_eq!(
            calldata[..4],
            IEIP3009::transferWithAuthorizationCall::SELECTOR
        );
        let decoded = IEIP3009::transferWithAuthorizationCall::abi_decode(&calldata).unwrap();
        assert!(decoded.v == 27 || decoded.v == 28);
        assert_eq!(decoded.from, signer.address());

        let mut raw = [0u8; 65];
        raw[..32].copy_from_slice(decoded.r.as_slice());
        raw[32..64].copy_from_slice(decoded.s.as_slice());
        raw[64] = decoded.v;
        let rebuilt = Signature::from_raw(&raw).unwrap();
        assert_eq!(rebuilt.recover_address_from_prehash(&hash).unwrap(), signer.address());
    }
}
