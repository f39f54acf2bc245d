use crate::split::{split, verify_share_public_keys, SecretShare};
use crate::SplitError;
use openssl::pkey::Private;
use openssl::rsa::{Padding, Rsa};
use ssv_types::{
    strip_hex_prefix, Operator, OperatorId, SecretKey, Share, ValidatorKeyMaterial,
    ENCRYPTED_KEY_LENGTH,
};
use tracing::{debug, instrument};
use zeroize::Zeroizing;

/// Split the validator key and encrypt each share for the operator it belongs to.
///
/// Shares are returned in the same order as `operators`.
#[instrument(skip_all, fields(validator = %key_material.public_key()))]
pub fn split_and_encrypt(
    key_material: &ValidatorKeyMaterial,
    operators: &[Operator],
) -> Result<Vec<Share>, SplitError> {
    let operator_ids: Vec<OperatorId> = operators.iter().map(|op| op.id).collect();
    let secret_shares = split(key_material, &operator_ids)?;

    let share_pubkeys: Vec<_> = secret_shares
        .iter()
        .map(|share| (share.operator_id, share.public_key))
        .collect();
    verify_share_public_keys(key_material.public_key(), &share_pubkeys)?;

    let shares = secret_shares
        .iter()
        .zip(operators)
        .map(|(share, operator)| encrypt_share(share, operator))
        .collect::<Result<Vec<_>, SplitError>>()?;

    debug!(shares = shares.len(), "Encrypted shares for operators");
    Ok(shares)
}

/// Like `split_and_encrypt`, taking operator ids and their encoded public keys as parallel lists
pub fn split_and_encrypt_keys(
    key_material: &ValidatorKeyMaterial,
    operator_ids: &[OperatorId],
    operator_keys: &[String],
) -> Result<Vec<Share>, SplitError> {
    let operators = parse_operators(operator_ids, operator_keys)?;
    split_and_encrypt(key_material, &operators)
}

/// Build operators from parallel id and key lists
pub fn parse_operators(
    operator_ids: &[OperatorId],
    operator_keys: &[String],
) -> Result<Vec<Operator>, SplitError> {
    if operator_ids.len() != operator_keys.len() {
        return Err(SplitError::OperatorCountMismatch {
            ids: operator_ids.len(),
            keys: operator_keys.len(),
        });
    }

    operator_ids
        .iter()
        .zip(operator_keys)
        .map(|(id, key)| {
            if **id == 0 {
                return Err(SplitError::InvalidOperatorId(*id));
            }
            Operator::new(key, *id)
                .map_err(|reason| SplitError::InvalidOperatorKey { id: *id, reason })
        })
        .collect()
}

// The plaintext is the 0x prefixed hex encoding of the big-endian share secret
fn encrypt_share(share: &SecretShare, operator: &Operator) -> Result<Share, SplitError> {
    if share.operator_id != operator.id {
        return Err(SplitError::Encryption(format!(
            "Share for operator {} paired with operator {}",
            share.operator_id, operator.id
        )));
    }

    let plaintext = share.secret.to_hex_string();
    let encrypted = operator
        .encrypt(plaintext.as_bytes())
        .map_err(SplitError::Encryption)?;
    let encrypted_private_key: [u8; ENCRYPTED_KEY_LENGTH] =
        encrypted.try_into().map_err(|e: Vec<u8>| {
            SplitError::Encryption(format!(
                "Encrypted key has wrong length: expected {}, got {}",
                ENCRYPTED_KEY_LENGTH,
                e.len()
            ))
        })?;

    Ok(Share {
        operator_id: share.operator_id,
        share_pubkey: share.public_key,
        encrypted_private_key,
    })
}

/// Operator side inverse of the share encryption
pub fn decrypt_share(
    operator_key: &Rsa<Private>,
    encrypted_private_key: &[u8],
) -> Result<SecretKey, SplitError> {
    let mut plaintext = Zeroizing::new(vec![0u8; operator_key.size() as usize]);
    let len = operator_key
        .private_decrypt(encrypted_private_key, &mut plaintext, Padding::PKCS1)
        .map_err(|e| SplitError::Decryption(e.to_string()))?;

    let hex_secret = std::str::from_utf8(&plaintext[..len])
        .map_err(|e| SplitError::Decryption(format!("Share is not utf8: {e}")))?;
    let bytes = Zeroizing::new(
        hex::decode(strip_hex_prefix(hex_secret))
            .map_err(|e| SplitError::Decryption(format!("Share is not hex: {e}")))?,
    );
    SecretKey::deserialize(&bytes).map_err(SplitError::Decryption)
}
