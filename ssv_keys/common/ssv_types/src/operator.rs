use crate::util::{encode_rsa, parse_rsa};
use derive_more::{Deref, Display, From};
use openssl::pkey::Public;
use openssl::rsa::{Padding, Rsa};
use std::cmp::Eq;
use std::fmt::Debug;
use std::hash::Hash;

/// The maximum number of operators a validator can be split across
/// https://github.com/ssvlabs/ssv/blob/07095fe31e3ded288af722a9c521117980585d95/eth/eventhandler/validation.go#L15
pub const MAX_OPERATORS: usize = 13;

// Operators register 2048 bit keys, which produce 256 byte ciphertexts
const RSA_KEY_BYTES: u32 = 256;

/// Unique identifier for an Operator.
#[derive(
    Clone, Copy, Debug, Default, Display, Eq, PartialEq, Hash, PartialOrd, Ord, From, Deref,
)]
pub struct OperatorId(pub u64);

/// Client that holds one encrypted share of each validator it is assigned to.
#[derive(Debug, Clone)]
pub struct Operator {
    /// ID to uniquely identify this operator
    pub id: OperatorId,
    /// RSA public key the operator publishes on chain
    pub rsa_pubkey: Rsa<Public>,
    /// Base-64 encoded PEM form of `rsa_pubkey`, kept as supplied
    pub encoded_pubkey: String,
}

impl Operator {
    /// Creates a new operator from its OperatorId and PEM-encoded public key string
    pub fn new(pem_data: &str, operator_id: OperatorId) -> Result<Self, String> {
        let rsa_pubkey = parse_rsa(pem_data)?;
        Self::checked(rsa_pubkey, operator_id, pem_data.trim().to_string())
    }

    // Creates a new operator from an existing RSA public key and OperatorId
    pub fn new_with_pubkey(rsa_pubkey: Rsa<Public>, id: OperatorId) -> Result<Self, String> {
        let encoded_pubkey = encode_rsa(&rsa_pubkey)?;
        Self::checked(rsa_pubkey, id, encoded_pubkey)
    }

    fn checked(
        rsa_pubkey: Rsa<Public>,
        id: OperatorId,
        encoded_pubkey: String,
    ) -> Result<Self, String> {
        if *id == 0 {
            return Err("Operator id must be positive".to_string());
        }
        if rsa_pubkey.size() != RSA_KEY_BYTES {
            return Err(format!(
                "Operator key must be 2048 bits, got {}",
                rsa_pubkey.size() * 8
            ));
        }
        Ok(Self {
            id,
            rsa_pubkey,
            encoded_pubkey,
        })
    }

    /// Encrypt data so that only this operator can recover it (RSA PKCS#1 v1.5)
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, String> {
        let mut ciphertext = vec![0u8; self.rsa_pubkey.size() as usize];
        let written = self
            .rsa_pubkey
            .public_encrypt(plaintext, &mut ciphertext, Padding::PKCS1)
            .map_err(|e| format!("Failed to encrypt for operator {}: {}", self.id, e))?;
        ciphertext.truncate(written);
        Ok(ciphertext)
    }
}

impl PartialEq for Operator {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.encoded_pubkey == other.encoded_pubkey
    }
}

impl Eq for Operator {}
