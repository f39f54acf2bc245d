use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// On-disk EIP-2335 layout. Field contents are checked when converting into a `Keystore`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct JsonKeystore {
    pub crypto: JsonCrypto,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pubkey: Option<String>,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub uuid: String,
    pub version: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct JsonCrypto {
    pub kdf: JsonModule,
    pub checksum: JsonModule,
    pub cipher: JsonModule,
}

/// Every crypto section shares the `{function, params, message}` shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct JsonModule {
    pub function: String,
    #[serde(default = "empty_params")]
    pub params: Value,
    #[serde(default)]
    pub message: String,
}

fn empty_params() -> Value {
    Value::Object(Map::new())
}

impl JsonModule {
    pub fn new(function: &str, params: Value, message: String) -> Self {
        Self {
            function: function.to_string(),
            params,
            message,
        }
    }
}
