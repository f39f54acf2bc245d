use crate::{BlsPublicKey, OperatorId};

/// Length of an encrypted key
pub const ENCRYPTED_KEY_LENGTH: usize = 256;

/// One of N shares of a split validator key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Share {
    /// Operator that is able to decrypt this share
    pub operator_id: OperatorId,
    /// The public key of this Share
    pub share_pubkey: BlsPublicKey,
    /// The encrypted private key of the share
    pub encrypted_private_key: [u8; ENCRYPTED_KEY_LENGTH],
}
