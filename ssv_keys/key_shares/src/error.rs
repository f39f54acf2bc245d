use keystore::KeystoreError;
use payload::PayloadError;
use ssv_types::OperatorId;
use std::fmt::Display;
use threshold::SplitError;

/// Errors raised while building, updating or loading key shares
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySharesError {
    /// An array is missing, has the wrong element type or the wrong length
    ArrayShape { field: String, reason: String },
    /// A BLS public key did not parse or did not match the validator key
    InvalidPublicKey { field: String, reason: String },
    /// An encrypted key is not an ABI encoded base64 string
    InvalidEncryptedShare { index: usize, reason: String },
    /// An operator public key could not be parsed
    InvalidOperatorKey { id: OperatorId, reason: String },
    /// Operator ids must be positive
    InvalidOperatorId(OperatorId),
    /// Document or item version is unknown or does not match
    UnsupportedVersion(String),
    /// Duplicate operator ids prevent a total order
    Ordering(OperatorId),
    /// A required field is absent
    MissingField(String),
    /// A stored payload disagrees with the item it belongs to
    PayloadMismatch(String),
    /// An item of a document failed validation
    InvalidItem {
        index: usize,
        error: Box<KeySharesError>,
    },
    /// Malformed JSON
    Json(String),
    Keystore(KeystoreError),
    Split(SplitError),
    Payload(PayloadError),
}

impl std::error::Error for KeySharesError {}

impl Display for KeySharesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ArrayShape { field, reason } => write!(f, "Invalid array {field}: {reason}"),
            Self::InvalidPublicKey { field, reason } => {
                write!(f, "Invalid public key in {field}: {reason}")
            }
            Self::InvalidEncryptedShare { index, reason } => {
                write!(f, "Invalid encrypted share at index {index}: {reason}")
            }
            Self::InvalidOperatorKey { id, reason } => {
                write!(f, "Invalid public key for operator {id}: {reason}")
            }
            Self::InvalidOperatorId(id) => write!(f, "Invalid operator id {id}"),
            Self::UnsupportedVersion(version) => write!(f, "Unsupported version: {version}"),
            Self::Ordering(id) => write!(f, "Operator {id} appears more than once"),
            Self::MissingField(field) => write!(f, "Missing field: {field}"),
            Self::PayloadMismatch(reason) => write!(f, "Payload does not match item: {reason}"),
            Self::InvalidItem { index, error } => write!(f, "Invalid item {index}: {error}"),
            Self::Json(reason) => write!(f, "Invalid JSON: {reason}"),
            Self::Keystore(e) => write!(f, "Keystore error: {e}"),
            Self::Split(e) => write!(f, "Split error: {e}"),
            Self::Payload(e) => write!(f, "Payload error: {e}"),
        }
    }
}

impl From<KeystoreError> for KeySharesError {
    fn from(error: KeystoreError) -> Self {
        Self::Keystore(error)
    }
}

impl From<SplitError> for KeySharesError {
    fn from(error: SplitError) -> Self {
        Self::Split(error)
    }
}

impl From<PayloadError> for KeySharesError {
    fn from(error: PayloadError) -> Self {
        Self::Payload(error)
    }
}

impl From<serde_json::Error> for KeySharesError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error.to_string())
    }
}
