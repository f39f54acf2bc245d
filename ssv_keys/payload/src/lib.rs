//! Assembly of the ABI encoded payload that registers a validator's shares on-chain.

pub use abi::{
    decode_encrypted_key, encode_encrypted_key, encrypted_key_from_hex, encrypted_key_to_hex,
};
pub use context::{OwnerContext, PayloadContext};
pub use error::PayloadError;
pub use payload::{build, DecodedPayload, Payload, ReadablePayload};

mod abi;
mod context;
mod error;
mod payload;
