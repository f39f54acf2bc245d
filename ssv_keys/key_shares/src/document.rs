use crate::{KeySharesError, KeySharesVersion};
use alloy::primitives::Address;
use payload::Payload;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An operator as it appears in a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorData {
    pub id: u64,
    /// Base64 encoded PEM
    pub public_key: String,
}

/// Share public keys and encrypted keys, aligned with the item's operators
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharesData {
    pub public_keys: Vec<String>,
    pub encrypted_keys: Vec<String>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DataFragment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_nonce: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operators: Option<Vec<OperatorData>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator_ids: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator_public_keys: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shares: Option<SharesData>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ItemFragment {
    /// Only written for standalone items, a document carries one version for all of them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<&'static str>,
    pub data: DataFragment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DocumentFragment {
    pub version: &'static str,
    pub shares: Vec<ItemFragment>,
}

/// Item fields read from a document, not yet validated
#[derive(Debug, Default)]
pub(crate) struct ParsedItem {
    pub public_key: Option<String>,
    pub operators: Option<Vec<OperatorData>>,
    pub shares: Option<SharesData>,
    pub payload: Option<Payload>,
    pub owner_address: Option<Address>,
    pub owner_nonce: Option<u64>,
}

/// Schema of a standalone item: its `version` key, or the shape of its operator fields when the
/// key is absent
pub(crate) fn detect_version(item: &Value) -> Result<KeySharesVersion, KeySharesError> {
    if let Some(version) = item.get("version").filter(|value| !value.is_null()) {
        return version
            .as_str()
            .ok_or_else(|| KeySharesError::UnsupportedVersion("version is not a string".to_string()))?
            .parse();
    }

    let data = item.get("data");
    let legacy = ["operatorIds", "operatorPublicKeys"]
        .iter()
        .any(|field| data.and_then(|d| d.get(field)).is_some());
    if legacy {
        Ok(KeySharesVersion::V2)
    } else {
        Ok(KeySharesVersion::V3)
    }
}

pub(crate) fn parse_item(
    version: KeySharesVersion,
    item: &Value,
) -> Result<ParsedItem, KeySharesError> {
    let item = object(item, "item")?;
    let data = item
        .get("data")
        .ok_or_else(|| KeySharesError::MissingField("data".to_string()))?;
    let data = object(data, "data")?;

    let operators = match version {
        KeySharesVersion::V3 => present(data, "operators")
            .map(parse_operators)
            .transpose()?,
        KeySharesVersion::V2 => parse_legacy_operators(data)?,
    };

    let shares = present(data, "shares")
        .map(|shares| {
            let shares = object(shares, "shares")?;
            Ok::<_, KeySharesError>(SharesData {
                public_keys: string_array(shares.get("publicKeys"), "shares.publicKeys")?,
                encrypted_keys: string_array(shares.get("encryptedKeys"), "shares.encryptedKeys")?,
            })
        })
        .transpose()?;

    let payload = present(item, "payload")
        .map(|payload| serde_json::from_value::<Payload>(payload.clone()))
        .transpose()?;

    let (owner_address, owner_nonce) = match version {
        KeySharesVersion::V3 => (
            present(data, "ownerAddress")
                .map(|address| serde_json::from_value::<Address>(address.clone()))
                .transpose()?,
            present(data, "ownerNonce")
                .map(|nonce| {
                    nonce.as_u64().ok_or_else(|| {
                        KeySharesError::Json("ownerNonce must be an unsigned integer".to_string())
                    })
                })
                .transpose()?,
        ),
        KeySharesVersion::V2 => (None, None),
    };

    let public_key = present(data, "publicKey")
        .map(|key| {
            key.as_str()
                .map(str::to_string)
                .ok_or_else(|| KeySharesError::Json("publicKey must be a string".to_string()))
        })
        .transpose()?;

    Ok(ParsedItem {
        public_key,
        operators,
        shares,
        payload,
        owner_address,
        owner_nonce,
    })
}

fn parse_operators(value: &Value) -> Result<Vec<OperatorData>, KeySharesError> {
    let entries = value.as_array().ok_or_else(|| KeySharesError::ArrayShape {
        field: "operators".to_string(),
        reason: "expected an array".to_string(),
    })?;

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let entry = entry.as_object().ok_or_else(|| KeySharesError::ArrayShape {
                field: "operators".to_string(),
                reason: format!("element {i} is not an object"),
            })?;
            let id = entry
                .get("id")
                .and_then(Value::as_u64)
                .ok_or_else(|| KeySharesError::MissingField(format!("operators[{i}].id")))?;
            let public_key = entry
                .get("publicKey")
                .and_then(Value::as_str)
                .ok_or_else(|| KeySharesError::MissingField(format!("operators[{i}].publicKey")))?;
            Ok(OperatorData {
                id,
                public_key: public_key.to_string(),
            })
        })
        .collect()
}

fn parse_legacy_operators(
    data: &Map<String, Value>,
) -> Result<Option<Vec<OperatorData>>, KeySharesError> {
    let (ids, keys) = match (
        present(data, "operatorIds"),
        present(data, "operatorPublicKeys"),
    ) {
        (None, None) => return Ok(None),
        (Some(_), None) => {
            return Err(KeySharesError::MissingField(
                "operatorPublicKeys".to_string(),
            ))
        }
        (None, Some(_)) => return Err(KeySharesError::MissingField("operatorIds".to_string())),
        (Some(ids), Some(keys)) => (ids, keys),
    };

    let ids = u64_array(ids, "operatorIds")?;
    let keys = string_array(Some(keys), "operatorPublicKeys")?;
    if ids.len() != keys.len() {
        return Err(KeySharesError::ArrayShape {
            field: "operatorPublicKeys".to_string(),
            reason: format!("expected {} entries, got {}", ids.len(), keys.len()),
        });
    }

    Ok(Some(
        ids.into_iter()
            .zip(keys)
            .map(|(id, public_key)| OperatorData { id, public_key })
            .collect(),
    ))
}

// Absent and null fields are treated alike
fn present<'a>(object: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    object.get(field).filter(|value| !value.is_null())
}

fn object<'a>(value: &'a Value, field: &str) -> Result<&'a Map<String, Value>, KeySharesError> {
    value
        .as_object()
        .ok_or_else(|| KeySharesError::Json(format!("{field} must be an object")))
}

fn string_array(value: Option<&Value>, field: &str) -> Result<Vec<String>, KeySharesError> {
    let shape_error = |reason: String| KeySharesError::ArrayShape {
        field: field.to_string(),
        reason,
    };
    let values = value
        .ok_or_else(|| KeySharesError::MissingField(field.to_string()))?
        .as_array()
        .ok_or_else(|| shape_error("expected an array".to_string()))?;

    values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            value
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| shape_error(format!("element {i} is not a string")))
        })
        .collect()
}

fn u64_array(value: &Value, field: &str) -> Result<Vec<u64>, KeySharesError> {
    let shape_error = |reason: String| KeySharesError::ArrayShape {
        field: field.to_string(),
        reason,
    };
    let values = value
        .as_array()
        .ok_or_else(|| shape_error("expected an array".to_string()))?;

    values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            value
                .as_u64()
                .ok_or_else(|| shape_error(format!("element {i} is not an unsigned integer")))
        })
        .collect()
}

#[cfg(test)]
mod document_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_version() {
        let v3 = json!({"data": {"operators": [], "publicKey": "0x"}});
        let v2 = json!({"data": {"operatorIds": [1], "operatorPublicKeys": ["a"]}});
        assert_eq!(detect_version(&v3).unwrap(), KeySharesVersion::V3);
        assert_eq!(detect_version(&v2).unwrap(), KeySharesVersion::V2);
        assert_eq!(detect_version(&json!({})).unwrap(), KeySharesVersion::V3);

        // an explicit version wins over the shape
        let empty_v2 = json!({"version": "v2", "data": {}});
        assert_eq!(detect_version(&empty_v2).unwrap(), KeySharesVersion::V2);
        assert!(matches!(
            detect_version(&json!({"version": "v9", "data": {}})),
            Err(KeySharesError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            detect_version(&json!({"version": 2, "data": {}})),
            Err(KeySharesError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_parse_v3_operators() {
        let item = json!({
            "data": {
                "publicKey": "0xab",
                "ownerNonce": 4,
                "operators": [{"id": 2, "publicKey": "a"}, {"id": 1, "publicKey": "b"}]
            }
        });
        let parsed = parse_item(KeySharesVersion::V3, &item).unwrap();
        assert_eq!(parsed.public_key.as_deref(), Some("0xab"));
        assert_eq!(parsed.owner_nonce, Some(4));
        assert_eq!(
            parsed.operators.unwrap(),
            vec![
                OperatorData { id: 2, public_key: "a".to_string() },
                OperatorData { id: 1, public_key: "b".to_string() },
            ]
        );
        assert!(parsed.shares.is_none());
        assert!(parsed.payload.is_none());
    }

    #[test]
    fn test_parse_legacy_operators() {
        let item = json!({
            "data": {"operatorIds": [1, 2], "operatorPublicKeys": ["a", "b"], "ownerNonce": 1}
        });
        let parsed = parse_item(KeySharesVersion::V2, &item).unwrap();
        assert_eq!(parsed.operators.unwrap().len(), 2);
        // owner fields are not part of the legacy schema
        assert_eq!(parsed.owner_nonce, None);

        let uneven = json!({"data": {"operatorIds": [1, 2], "operatorPublicKeys": ["a"]}});
        assert!(matches!(
            parse_item(KeySharesVersion::V2, &uneven),
            Err(KeySharesError::ArrayShape { field, .. }) if field == "operatorPublicKeys"
        ));

        let missing = json!({"data": {"operatorIds": [1, 2]}});
        assert_eq!(
            parse_item(KeySharesVersion::V2, &missing).unwrap_err(),
            KeySharesError::MissingField("operatorPublicKeys".to_string())
        );
    }

    #[test]
    fn test_shape_errors() {
        let not_array = json!({"data": {"operators": {"id": 1}}});
        assert!(matches!(
            parse_item(KeySharesVersion::V3, &not_array),
            Err(KeySharesError::ArrayShape { field, .. }) if field == "operators"
        ));

        let bad_element = json!({"data": {"shares": {"publicKeys": ["0x", 5], "encryptedKeys": []}}});
        assert!(matches!(
            parse_item(KeySharesVersion::V3, &bad_element),
            Err(KeySharesError::ArrayShape { field, .. }) if field == "shares.publicKeys"
        ));

        let missing_id = json!({"data": {"operators": [{"publicKey": "a"}]}});
        assert_eq!(
            parse_item(KeySharesVersion::V3, &missing_id).unwrap_err(),
            KeySharesError::MissingField("operators[0].id".to_string())
        );

        assert_eq!(
            parse_item(KeySharesVersion::V3, &json!({"payload": null})).unwrap_err(),
            KeySharesError::MissingField("data".to_string())
        );
        assert!(matches!(
            parse_item(KeySharesVersion::V3, &json!([1, 2])),
            Err(KeySharesError::Json(_))
        ));
    }
}
