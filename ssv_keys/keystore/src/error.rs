use std::fmt::Display;

/// Errors raised while reading or decrypting a keystore
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeystoreError {
    /// The keystore does not follow the expected schema
    InvalidKeystoreFormat(String),
    /// The checksum did not match, the password is wrong or the file was tampered with
    InvalidPassword,
}

impl std::error::Error for KeystoreError {}

impl Display for KeystoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidKeystoreFormat(reason) => write!(f, "Invalid keystore format: {reason}"),
            Self::InvalidPassword => write!(f, "Invalid keystore password"),
        }
    }
}

// Shorthand for structural failures
pub(crate) fn format_error(reason: impl Into<String>) -> KeystoreError {
    KeystoreError::InvalidKeystoreFormat(reason.into())
}
