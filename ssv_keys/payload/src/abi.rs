use crate::PayloadError;
use alloy::sol;
use alloy::sol_types::SolValue;
use base64::prelude::*;
use ssv_types::{strip_hex_prefix, ENCRYPTED_KEY_LENGTH};

// Parameter layouts of the registration calls on the SSV Network contract
sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct RegistrationPayload {
        bytes publicKey;
        uint64[] operatorIds;
        bytes[] sharePublicKeys;
        bytes[] sharesEncrypted;
        address owner;
        uint64 nonce;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct DepositPayload {
        bytes publicKey;
        uint64[] operatorIds;
        bytes[] sharePublicKeys;
        bytes[] sharesEncrypted;
        uint256 amount;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct RegistrationDepositPayload {
        bytes publicKey;
        uint64[] operatorIds;
        bytes[] sharePublicKeys;
        bytes[] sharesEncrypted;
        address owner;
        uint64 nonce;
        uint256 amount;
    }
}

/// ABI encode an encrypted key as a single `string` holding its base64 form
pub fn encode_encrypted_key(encrypted_key: &[u8]) -> Vec<u8> {
    BASE64_STANDARD.encode(encrypted_key).abi_encode()
}

/// Inverse of `encode_encrypted_key`
pub fn decode_encrypted_key(encoded: &[u8]) -> Result<[u8; ENCRYPTED_KEY_LENGTH], PayloadError> {
    let base64_key = String::abi_decode(encoded, true)
        .map_err(|e| PayloadError::InvalidEncryptedShare(format!("Not an ABI string: {e}")))?;
    let encrypted = BASE64_STANDARD
        .decode(base64_key.trim())
        .map_err(|e| PayloadError::InvalidEncryptedShare(format!("Not base64: {e}")))?;

    encrypted.try_into().map_err(|e: Vec<u8>| {
        PayloadError::InvalidEncryptedShare(format!(
            "Encrypted key has wrong length: expected {}, got {}",
            ENCRYPTED_KEY_LENGTH,
            e.len()
        ))
    })
}

/// The `0x` prefixed hex form used for encrypted keys in documents
pub fn encrypted_key_to_hex(encrypted_key: &[u8]) -> String {
    format!("0x{}", hex::encode(encode_encrypted_key(encrypted_key)))
}

pub fn encrypted_key_from_hex(
    hex_key: &str,
) -> Result<[u8; ENCRYPTED_KEY_LENGTH], PayloadError> {
    let encoded = hex::decode(strip_hex_prefix(hex_key))
        .map_err(|e| PayloadError::InvalidEncryptedShare(format!("Not hex: {e}")))?;
    decode_encrypted_key(&encoded)
}

#[cfg(test)]
mod abi_tests {
    use super::*;

    #[test]
    fn test_encrypted_key_layout() {
        let key = [7u8; ENCRYPTED_KEY_LENGTH];
        let encoded = encode_encrypted_key(&key);

        // offset word, length word, then the padded base64 text
        let base64_len = BASE64_STANDARD.encode(key).len();
        assert_eq!(base64_len, 344);
        assert_eq!(encoded.len(), 64 + base64_len.div_ceil(32) * 32);
        assert_eq!(encoded[31], 0x20);
        assert_eq!(encoded[63] as usize + ((encoded[62] as usize) << 8), base64_len);

        assert_eq!(decode_encrypted_key(&encoded).unwrap(), key);
    }

    #[test]
    fn test_encrypted_key_hex() {
        let key = [0xabu8; ENCRYPTED_KEY_LENGTH];
        let hex_key = encrypted_key_to_hex(&key);
        assert!(hex_key.starts_with("0x"));
        assert_eq!(encrypted_key_from_hex(&hex_key).unwrap(), key);
        assert_eq!(encrypted_key_from_hex(&hex_key[2..]).unwrap(), key);
    }

    #[test]
    fn test_malformed_encrypted_keys() {
        // Too short once decoded
        let short = encode_encrypted_key(&[1u8; 100]);
        assert!(matches!(
            decode_encrypted_key(&short),
            Err(PayloadError::InvalidEncryptedShare(_))
        ));

        // A valid string that is not base64
        let not_base64 = "definitely not base64!".to_string().abi_encode();
        assert!(matches!(
            decode_encrypted_key(&not_base64),
            Err(PayloadError::InvalidEncryptedShare(_))
        ));

        // Raw ciphertext without the string wrapping
        assert!(decode_encrypted_key(&[0u8; ENCRYPTED_KEY_LENGTH]).is_err());
        assert!(encrypted_key_from_hex("0xnothex").is_err());
    }
}
