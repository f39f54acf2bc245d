use ssv_types::OperatorId;
use std::fmt::Display;

// Payload assembly and decoding errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// Duplicate operator ids prevent a total order
    Ordering(OperatorId),
    /// Operator and share lists differ in length
    OperatorCountMismatch { operators: usize, shares: usize },
    /// No share was given for this operator
    ShareOperatorMismatch(OperatorId),
    /// Neither an owner nor a token amount was supplied, or the owner is incomplete
    MissingContext(String),
    /// An encrypted share does not follow the ABI string convention
    InvalidEncryptedShare(String),
    /// The raw payload could not be decoded
    Decode(String),
}

impl std::error::Error for PayloadError {}

impl Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ordering(id) => write!(f, "Operator {id} appears more than once"),
            Self::OperatorCountMismatch { operators, shares } => {
                write!(f, "Got {operators} operators but {shares} shares")
            }
            Self::ShareOperatorMismatch(id) => write!(f, "No share for operator {id}"),
            Self::MissingContext(reason) => write!(f, "Invalid payload context: {reason}"),
            Self::InvalidEncryptedShare(reason) => write!(f, "Invalid encrypted share: {reason}"),
            Self::Decode(reason) => write!(f, "Failed to decode payload: {reason}"),
        }
    }
}
