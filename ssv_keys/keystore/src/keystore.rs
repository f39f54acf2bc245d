use crate::error::{format_error, KeystoreError};
use crate::json::{JsonCrypto, JsonKeystore, JsonModule};
use crate::kdf::{Kdf, KdfKind};
use aes::Aes128;
use ctr::cipher::{KeyIvInit, StreamCipher};
use rand::RngCore;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use ssv_types::{strip_hex_prefix, BlsPublicKey, SecretKey, ValidatorKeyMaterial};
use std::str::FromStr;
use subtle::ConstantTimeEq;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroizing;

type Aes128Ctr = ctr::Ctr128BE<Aes128>;

const KEYSTORE_VERSION: u32 = 4;
const AES_128_CTR: &str = "aes-128-ctr";
const SHA256: &str = "sha256";
const IV_LENGTH: usize = 16;
const SALT_LENGTH: usize = 32;
const CHECKSUM_LENGTH: usize = 32;

/// A parsed EIP-2335 keystore.
///
/// Parsing validates the whole schema up front, so `decrypt` only fails on a wrong password or on
/// decrypted contents that do not form a valid key.
#[derive(Debug, Clone)]
pub struct Keystore {
    kdf: Kdf,
    checksum: [u8; CHECKSUM_LENGTH],
    iv: [u8; IV_LENGTH],
    ciphertext: Vec<u8>,
    pubkey: Option<BlsPublicKey>,
    path: String,
    uuid: String,
    description: Option<String>,
}

impl Keystore {
    /// Parse a keystore from its JSON encoding
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, KeystoreError> {
        let json: JsonKeystore = serde_json::from_slice(bytes)
            .map_err(|e| format_error(format!("Keystore is not valid JSON: {e}")))?;
        Self::try_from(json)
    }

    /// Parse a keystore from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, KeystoreError> {
        Self::from_json_slice(json.as_bytes())
    }

    /// The validator public key declared by the keystore, if any
    pub fn pubkey(&self) -> Option<&BlsPublicKey> {
        self.pubkey.as_ref()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn kdf(&self) -> &Kdf {
        &self.kdf
    }

    /// Recover the validator key. The checksum is verified before anything is decrypted.
    pub fn decrypt(&self, password: &str) -> Result<ValidatorKeyMaterial, KeystoreError> {
        let password = process_password(password);
        let derived = self.kdf.derive_key(password.as_bytes())?;

        let checksum = checksum(&derived[16..], &self.ciphertext);
        if !bool::from(checksum.as_slice().ct_eq(&self.checksum)) {
            debug!(uuid = %self.uuid, "Keystore checksum mismatch");
            return Err(KeystoreError::InvalidPassword);
        }

        let mut plaintext = Zeroizing::new(self.ciphertext.clone());
        let mut cipher = Aes128Ctr::new_from_slices(&derived[..16], &self.iv)
            .map_err(|e| format_error(format!("Invalid cipher parameters: {e}")))?;
        cipher.apply_keystream(&mut plaintext);

        let secret = SecretKey::deserialize(&plaintext)
            .map_err(|e| format_error(format!("Keystore does not hold a valid secret: {e}")))?;
        let material = ValidatorKeyMaterial::new(secret);

        if let Some(pubkey) = &self.pubkey {
            if pubkey != material.public_key() {
                return Err(format_error(
                    "Decrypted secret does not match the keystore public key",
                ));
            }
        }

        debug!(
            uuid = %self.uuid,
            pubkey = %material.public_key(),
            "Decrypted keystore"
        );
        Ok(material)
    }

    /// Encrypt key material into a fresh keystore with a random salt, iv and uuid
    pub fn encrypt(
        material: &ValidatorKeyMaterial,
        password: &str,
        kdf: KdfKind,
        path: &str,
    ) -> Result<Self, KeystoreError> {
        let mut rng = rand::thread_rng();
        let mut salt = vec![0u8; SALT_LENGTH];
        rng.fill_bytes(&mut salt);
        let mut iv = [0u8; IV_LENGTH];
        rng.fill_bytes(&mut iv);

        let kdf = Kdf::with_salt(kdf, salt);
        let password = process_password(password);
        let derived = kdf.derive_key(password.as_bytes())?;

        let mut ciphertext = material.secret().serialize().to_vec();
        let mut cipher = Aes128Ctr::new_from_slices(&derived[..16], &iv)
            .map_err(|e| format_error(format!("Invalid cipher parameters: {e}")))?;
        cipher.apply_keystream(&mut ciphertext);
        let checksum = checksum(&derived[16..], &ciphertext);

        Ok(Self {
            kdf,
            checksum,
            iv,
            ciphertext,
            pubkey: Some(*material.public_key()),
            path: path.to_string(),
            uuid: uuid::Uuid::new_v4().to_string(),
            description: None,
        })
    }

    /// Serialize to the EIP-2335 JSON layout
    pub fn to_json_string(&self) -> Result<String, KeystoreError> {
        let json = JsonKeystore {
            crypto: JsonCrypto {
                kdf: self.kdf.to_module(),
                checksum: JsonModule::new(SHA256, json!({}), hex::encode(self.checksum)),
                cipher: JsonModule::new(
                    AES_128_CTR,
                    json!({ "iv": hex::encode(self.iv) }),
                    hex::encode(&self.ciphertext),
                ),
            },
            description: self.description.clone(),
            pubkey: self
                .pubkey
                .map(|pk| hex::encode(pk.serialize())),
            path: self.path.clone(),
            uuid: self.uuid.clone(),
            version: KEYSTORE_VERSION,
        };
        serde_json::to_string_pretty(&json)
            .map_err(|e| format_error(format!("Failed to serialize keystore: {e}")))
    }
}

impl TryFrom<JsonKeystore> for Keystore {
    type Error = KeystoreError;

    fn try_from(json: JsonKeystore) -> Result<Self, Self::Error> {
        if json.version != KEYSTORE_VERSION {
            return Err(format_error(format!(
                "Unsupported keystore version {}",
                json.version
            )));
        }

        let kdf = Kdf::from_module(&json.crypto.kdf)?;

        // Checksum section
        let checksum = &json.crypto.checksum;
        if checksum.function != SHA256 {
            return Err(format_error(format!(
                "Unsupported checksum function {}",
                checksum.function
            )));
        }
        let checksum: [u8; CHECKSUM_LENGTH] = decode_hex(&checksum.message, "checksum message")?
            .try_into()
            .map_err(|_| format_error("Checksum message must be 32 bytes"))?;

        // Cipher section
        let cipher = &json.crypto.cipher;
        if cipher.function != AES_128_CTR {
            return Err(format_error(format!(
                "Unsupported cipher function {}",
                cipher.function
            )));
        }
        let iv = cipher
            .params
            .get("iv")
            .and_then(Value::as_str)
            .ok_or_else(|| format_error("Missing cipher parameter iv"))?;
        let iv: [u8; IV_LENGTH] = decode_hex(iv, "cipher iv")?
            .try_into()
            .map_err(|_| format_error("Cipher iv must be 16 bytes"))?;
        let ciphertext = decode_hex(&cipher.message, "cipher message")?;
        if ciphertext.is_empty() {
            return Err(format_error("Cipher message is empty"));
        }

        let pubkey = match json.pubkey.as_deref() {
            None | Some("") => None,
            Some(pubkey) => Some(
                BlsPublicKey::from_str(pubkey)
                    .map_err(|e| format_error(format!("Invalid keystore pubkey: {e}")))?,
            ),
        };

        Ok(Self {
            kdf,
            checksum,
            iv,
            ciphertext,
            pubkey,
            path: json.path,
            uuid: json.uuid,
            description: json.description,
        })
    }
}

// sha256(dk[16..32] || ciphertext)
fn checksum(key_half: &[u8], ciphertext: &[u8]) -> [u8; CHECKSUM_LENGTH] {
    Sha256::new()
        .chain_update(key_half)
        .chain_update(ciphertext)
        .finalize()
        .into()
}

// NFKD normalised, then control codes (C0, C1 and DEL) are stripped
fn process_password(password: &str) -> Zeroizing<String> {
    Zeroizing::new(password.nfkd().filter(|c| !c.is_control()).collect())
}

fn decode_hex(data: &str, field: &str) -> Result<Vec<u8>, KeystoreError> {
    hex::decode(strip_hex_prefix(data))
        .map_err(|e| format_error(format!("Keystore {field} is not hex: {e}")))
}
