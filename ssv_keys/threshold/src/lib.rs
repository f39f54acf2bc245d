//! Threshold splitting of validator keys into operator shares.

pub use committee::{get_f, threshold, validate_committee, validate_operator_ids};
pub use encrypt::{decrypt_share, parse_operators, split_and_encrypt, split_and_encrypt_keys};
pub use error::SplitError;
pub use split::{reconstruct, split, split_with_rng, verify_share_public_keys, SecretShare};

mod committee;
mod encrypt;
mod error;
mod polynomial;
mod split;
