pub use bls::{BlsPublicKey, SecretKey, ValidatorKeyMaterial, PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH};
pub use operator::{Operator, OperatorId, MAX_OPERATORS};
pub use share::{Share, ENCRYPTED_KEY_LENGTH};
pub use util::{encode_rsa, parse_rsa, strip_hex_prefix};
mod bls;
mod operator;
mod share;
mod util;
