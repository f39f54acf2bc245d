//! Extraction of validator key material from EIP-2335 keystores.

pub use error::KeystoreError;
pub use kdf::{Kdf, KdfKind};
pub use keystore::Keystore;

use ssv_types::ValidatorKeyMaterial;

mod error;
mod json;
mod kdf;
mod keystore;

/// Parse a keystore and decrypt it with `password`
pub fn decrypt(keystore_bytes: &[u8], password: &str) -> Result<ValidatorKeyMaterial, KeystoreError> {
    Keystore::from_json_slice(keystore_bytes)?.decrypt(password)
}
