use ssv_types::OperatorId;
use std::fmt::Display;

/// Errors raised while splitting a validator key into operator shares
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitError {
    /// Operator id and public key lists differ in length
    OperatorCountMismatch { ids: usize, keys: usize },
    /// An operator public key could not be parsed
    InvalidOperatorKey { id: OperatorId, reason: String },
    /// Operator ids must be positive
    InvalidOperatorId(OperatorId),
    /// The number of operators is not supported
    InvalidOperatorCount(String),
    /// An operator appears more than once
    DuplicateOperator(OperatorId),
    /// A derived secret was unusable
    InvalidSecret(String),
    /// Share public keys do not lie on a single polynomial matching the validator key
    InconsistentShares(String),
    /// Encrypting a share for an operator failed
    Encryption(String),
    /// Decrypting a share with an operator key failed
    Decryption(String),
}

impl std::error::Error for SplitError {}

impl Display for SplitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OperatorCountMismatch { ids, keys } => {
                write!(f, "Got {ids} operator ids but {keys} operator keys")
            }
            Self::InvalidOperatorKey { id, reason } => {
                write!(f, "Invalid public key for operator {id}: {reason}")
            }
            Self::InvalidOperatorId(id) => write!(f, "Invalid operator id {id}"),
            Self::InvalidOperatorCount(reason) => write!(f, "Invalid operator count: {reason}"),
            Self::DuplicateOperator(id) => write!(f, "Operator {id} appears more than once"),
            Self::InvalidSecret(reason) => write!(f, "Invalid secret: {reason}"),
            Self::InconsistentShares(reason) => write!(f, "Inconsistent shares: {reason}"),
            Self::Encryption(reason) => write!(f, "Share encryption failed: {reason}"),
            Self::Decryption(reason) => write!(f, "Share decryption failed: {reason}"),
        }
    }
}
