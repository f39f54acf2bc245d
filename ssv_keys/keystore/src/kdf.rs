use crate::error::{format_error, KeystoreError};
use crate::json::JsonModule;
use pbkdf2::pbkdf2_hmac;
use serde_json::{json, Value};
use sha2::Sha256;
use ssv_types::strip_hex_prefix;
use zeroize::Zeroizing;

/// Length of the derived key. The first half keys the cipher, the second half the checksum.
pub const DERIVED_KEY_LENGTH: usize = 32;

const SCRYPT: &str = "scrypt";
const PBKDF2: &str = "pbkdf2";
const HMAC_SHA256: &str = "hmac-sha256";

// Upper bounds on work factors accepted from untrusted files
const MAX_SCRYPT_LOG_N: u8 = 20;
const MAX_SCRYPT_P: u32 = 16;
// scrypt allocates 128 * r * (n + p) bytes
const MAX_SCRYPT_MEMORY: u64 = 1 << 31;
const MAX_PBKDF2_ROUNDS: u32 = 1 << 24;

/// A key derivation function with its parameters, as declared by a keystore
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kdf {
    Scrypt {
        log_n: u8,
        r: u32,
        p: u32,
        salt: Vec<u8>,
    },
    Pbkdf2 {
        rounds: u32,
        salt: Vec<u8>,
    },
}

/// Which KDF to use when creating a new keystore
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KdfKind {
    Scrypt { log_n: u8 },
    Pbkdf2 { rounds: u32 },
}

impl Default for KdfKind {
    fn default() -> Self {
        // n = 262144, the value used by the staking deposit tooling
        Self::Scrypt { log_n: 18 }
    }
}

impl Kdf {
    pub(crate) fn with_salt(kind: KdfKind, salt: Vec<u8>) -> Self {
        match kind {
            KdfKind::Scrypt { log_n } => Self::Scrypt {
                log_n,
                r: 8,
                p: 1,
                salt,
            },
            KdfKind::Pbkdf2 { rounds } => Self::Pbkdf2 { rounds, salt },
        }
    }

    /// Parse and bound-check the kdf section of a keystore
    pub(crate) fn from_module(module: &JsonModule) -> Result<Self, KeystoreError> {
        let params = &module.params;
        let dklen = get_u64(params, "dklen")?;
        if dklen != DERIVED_KEY_LENGTH as u64 {
            return Err(format_error(format!(
                "Unsupported kdf dklen {dklen}, expected {DERIVED_KEY_LENGTH}"
            )));
        }
        let salt = get_hex(params, "salt")?;
        if salt.is_empty() {
            return Err(format_error("Kdf salt is empty"));
        }

        match module.function.as_str() {
            SCRYPT => {
                let n = get_u64(params, "n")?;
                if n < 2 || !n.is_power_of_two() {
                    return Err(format_error(format!(
                        "Scrypt n must be a power of two, got {n}"
                    )));
                }
                let log_n = n.trailing_zeros() as u8;
                if log_n > MAX_SCRYPT_LOG_N {
                    return Err(format_error(format!("Scrypt n {n} exceeds the allowed maximum")));
                }
                let r = get_u32(params, "r")?;
                let p = get_u32(params, "p")?;
                if r == 0 || p == 0 {
                    return Err(format_error("Scrypt r and p must be positive"));
                }
                if p > MAX_SCRYPT_P {
                    return Err(format_error(format!("Scrypt p {p} exceeds the allowed maximum")));
                }
                // n <= 2^20 and p <= 16, so this cannot overflow
                let memory = 128 * u64::from(r) * (n + u64::from(p));
                if memory > MAX_SCRYPT_MEMORY {
                    return Err(format_error(format!(
                        "Scrypt parameters n={n} r={r} p={p} need {memory} bytes of memory"
                    )));
                }
                Ok(Self::Scrypt { log_n, r, p, salt })
            }
            PBKDF2 => {
                let prf = params
                    .get("prf")
                    .and_then(Value::as_str)
                    .ok_or_else(|| format_error("Missing kdf parameter prf"))?;
                if prf != HMAC_SHA256 {
                    return Err(format_error(format!("Unsupported pbkdf2 prf {prf}")));
                }
                let rounds = get_u32(params, "c")?;
                if rounds == 0 || rounds > MAX_PBKDF2_ROUNDS {
                    return Err(format_error(format!("Pbkdf2 rounds {rounds} out of range")));
                }
                Ok(Self::Pbkdf2 { rounds, salt })
            }
            other => Err(format_error(format!("Unsupported kdf function {other}"))),
        }
    }

    pub(crate) fn to_module(&self) -> JsonModule {
        match self {
            Self::Scrypt { log_n, r, p, salt } => JsonModule::new(
                SCRYPT,
                json!({
                    "dklen": DERIVED_KEY_LENGTH,
                    "n": 1u64 << log_n,
                    "r": r,
                    "p": p,
                    "salt": hex::encode(salt),
                }),
                String::new(),
            ),
            Self::Pbkdf2 { rounds, salt } => JsonModule::new(
                PBKDF2,
                json!({
                    "dklen": DERIVED_KEY_LENGTH,
                    "c": rounds,
                    "prf": HMAC_SHA256,
                    "salt": hex::encode(salt),
                }),
                String::new(),
            ),
        }
    }

    /// Derive the decryption key from a processed password
    pub(crate) fn derive_key(
        &self,
        password: &[u8],
    ) -> Result<Zeroizing<[u8; DERIVED_KEY_LENGTH]>, KeystoreError> {
        let mut derived = Zeroizing::new([0u8; DERIVED_KEY_LENGTH]);
        match self {
            Self::Scrypt { log_n, r, p, salt } => {
                let params = scrypt::Params::new(*log_n, *r, *p, DERIVED_KEY_LENGTH)
                    .map_err(|e| format_error(format!("Invalid scrypt parameters: {e}")))?;
                scrypt::scrypt(password, salt, &params, derived.as_mut_slice())
                    .map_err(|e| format_error(format!("Scrypt failed: {e}")))?;
            }
            Self::Pbkdf2 { rounds, salt } => {
                pbkdf2_hmac::<Sha256>(password, salt, *rounds, derived.as_mut_slice());
            }
        }
        Ok(derived)
    }
}

fn get_u64(params: &Value, name: &str) -> Result<u64, KeystoreError> {
    params
        .get(name)
        .and_then(Value::as_u64)
        .ok_or_else(|| format_error(format!("Missing or invalid kdf parameter {name}")))
}

fn get_u32(params: &Value, name: &str) -> Result<u32, KeystoreError> {
    u32::try_from(get_u64(params, name)?)
        .map_err(|_| format_error(format!("Kdf parameter {name} is too large")))
}

fn get_hex(params: &Value, name: &str) -> Result<Vec<u8>, KeystoreError> {
    let value = params
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| format_error(format!("Missing kdf parameter {name}")))?;
    hex::decode(strip_hex_prefix(value))
        .map_err(|e| format_error(format!("Kdf parameter {name} is not hex: {e}")))
}
