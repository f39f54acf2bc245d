use crate::abi::{
    encode_encrypted_key, DepositPayload, RegistrationDepositPayload, RegistrationPayload,
};
use crate::context::{OwnerContext, PayloadContext};
use crate::PayloadError;
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolValue;
use serde::{Deserialize, Serialize};
use ssv_types::{BlsPublicKey, OperatorId, Share};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// A registration payload in both its human readable and its ABI encoded form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub readable: ReadablePayload,
    pub raw: Bytes,
}

/// The fields of the encoded payload, in the same order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadablePayload {
    pub public_key: Bytes,
    pub operator_ids: Vec<u64>,
    pub share_public_keys: Vec<Bytes>,
    pub shares_encrypted: Vec<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_nonce: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<U256>,
}

/// Contents of `Payload::raw` after ABI decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPayload {
    pub public_key: Bytes,
    pub operator_ids: Vec<u64>,
    pub share_public_keys: Vec<Bytes>,
    pub shares_encrypted: Vec<Bytes>,
    pub owner: Option<OwnerContext>,
    pub amount: Option<U256>,
}

/// Assemble the payload for a validator.
///
/// Operators and their shares are sorted ascending by operator id before encoding, the
/// consuming contract relies on this order. Only public data and encrypted shares are used.
#[instrument(skip_all, fields(validator = %validator_pubkey, operators = operator_ids.len()))]
pub fn build(
    validator_pubkey: &BlsPublicKey,
    operator_ids: &[OperatorId],
    shares: &[Share],
    context: &PayloadContext,
) -> Result<Payload, PayloadError> {
    context.validate()?;
    if operator_ids.len() != shares.len() {
        return Err(PayloadError::OperatorCountMismatch {
            operators: operator_ids.len(),
            shares: shares.len(),
        });
    }

    let mut sorted_ids = operator_ids.to_vec();
    sorted_ids.sort_unstable();
    if let Some(pair) = sorted_ids.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(PayloadError::Ordering(pair[0]));
    }

    let mut shares_by_operator = BTreeMap::new();
    for share in shares {
        if shares_by_operator.insert(share.operator_id, share).is_some() {
            return Err(PayloadError::Ordering(share.operator_id));
        }
    }
    let ordered_shares = sorted_ids
        .iter()
        .map(|id| {
            shares_by_operator
                .get(id)
                .copied()
                .ok_or(PayloadError::ShareOperatorMismatch(*id))
        })
        .collect::<Result<Vec<&Share>, PayloadError>>()?;

    let readable = ReadablePayload {
        public_key: Bytes::copy_from_slice(&validator_pubkey.serialize()),
        operator_ids: sorted_ids.iter().map(|id| **id).collect(),
        share_public_keys: ordered_shares
            .iter()
            .map(|share| Bytes::copy_from_slice(&share.share_pubkey.serialize()))
            .collect(),
        shares_encrypted: ordered_shares
            .iter()
            .map(|share| Bytes::from(encode_encrypted_key(&share.encrypted_private_key)))
            .collect(),
        owner_address: context.owner.map(|owner| owner.address),
        owner_nonce: context.owner.map(|owner| owner.nonce),
        amount: context.amount,
    };
    let raw = encode(&readable, context)?;

    debug!(raw_len = raw.len(), "Assembled payload");
    Ok(Payload { readable, raw })
}

fn encode(readable: &ReadablePayload, context: &PayloadContext) -> Result<Bytes, PayloadError> {
    let public_key = readable.public_key.clone();
    let operator_ids = readable.operator_ids.clone();
    let share_public_keys = readable.share_public_keys.clone();
    let shares_encrypted = readable.shares_encrypted.clone();

    let encoded = match (context.owner, context.amount) {
        (Some(owner), None) => RegistrationPayload {
            publicKey: public_key,
            operatorIds: operator_ids,
            sharePublicKeys: share_public_keys,
            sharesEncrypted: shares_encrypted,
            owner: owner.address,
            nonce: owner.nonce,
        }
        .abi_encode_params(),
        (None, Some(amount)) => DepositPayload {
            publicKey: public_key,
            operatorIds: operator_ids,
            sharePublicKeys: share_public_keys,
            sharesEncrypted: shares_encrypted,
            amount,
        }
        .abi_encode_params(),
        (Some(owner), Some(amount)) => RegistrationDepositPayload {
            publicKey: public_key,
            operatorIds: operator_ids,
            sharePublicKeys: share_public_keys,
            sharesEncrypted: shares_encrypted,
            owner: owner.address,
            nonce: owner.nonce,
            amount,
        }
        .abi_encode_params(),
        (None, None) => {
            return Err(PayloadError::MissingContext(
                "Either an owner or a token amount is required".to_string(),
            ))
        }
    };
    Ok(Bytes::from(encoded))
}

impl Payload {
    /// The context recorded in the readable payload
    pub fn context(&self) -> Result<PayloadContext, PayloadError> {
        PayloadContext::from_parts(
            self.readable.owner_address,
            self.readable.owner_nonce,
            self.readable.amount,
        )
    }

    /// ABI decode `raw` using the layout implied by the readable context
    pub fn decode(&self) -> Result<DecodedPayload, PayloadError> {
        let context = self.context()?;
        let decode_error = |e: alloy::sol_types::Error| PayloadError::Decode(e.to_string());

        let decoded = match (context.owner, context.amount) {
            (Some(_), None) => {
                let payload =
                    RegistrationPayload::abi_decode_params(&self.raw, true).map_err(decode_error)?;
                DecodedPayload {
                    public_key: payload.publicKey,
                    operator_ids: payload.operatorIds,
                    share_public_keys: payload.sharePublicKeys,
                    shares_encrypted: payload.sharesEncrypted,
                    owner: Some(OwnerContext {
                        address: payload.owner,
                        nonce: payload.nonce,
                    }),
                    amount: None,
                }
            }
            (None, Some(_)) => {
                let payload =
                    DepositPayload::abi_decode_params(&self.raw, true).map_err(decode_error)?;
                DecodedPayload {
                    public_key: payload.publicKey,
                    operator_ids: payload.operatorIds,
                    share_public_keys: payload.sharePublicKeys,
                    shares_encrypted: payload.sharesEncrypted,
                    owner: None,
                    amount: Some(payload.amount),
                }
            }
            (Some(_), Some(_)) => {
                let payload = RegistrationDepositPayload::abi_decode_params(&self.raw, true)
                    .map_err(decode_error)?;
                DecodedPayload {
                    public_key: payload.publicKey,
                    operator_ids: payload.operatorIds,
                    share_public_keys: payload.sharePublicKeys,
                    shares_encrypted: payload.sharesEncrypted,
                    owner: Some(OwnerContext {
                        address: payload.owner,
                        nonce: payload.nonce,
                    }),
                    amount: Some(payload.amount),
                }
            }
            (None, None) => {
                return Err(PayloadError::MissingContext(
                    "Payload carries no context".to_string(),
                ))
            }
        };

        Ok(decoded)
    }
}
