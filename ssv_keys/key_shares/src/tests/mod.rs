mod collection_tests;
mod utils;

pub mod test_prelude {
    pub use super::utils::*;
    pub use crate::*;
    pub use alloy::primitives::{Address, U256};
    pub use payload::PayloadContext;
    pub use serde_json::{json, Value};
    pub use ssv_types::*;
}
