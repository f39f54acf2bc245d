use super::test_prelude::*;

// Collection with one item per nonce, all for the same committee
fn collection(fixture: &TestFixture, items: u64) -> KeyShares {
    let mut key_shares = KeyShares::new(fixture.version);
    for nonce in 0..items {
        let item = fixture.item(&generators::context::registration(nonce));
        key_shares.add(item).expect("Failed to add item");
    }
    key_shares
}

#[cfg(test)]
mod collection_tests {
    use super::*;

    #[test]
    fn test_serialize_round_trip() {
        for version in [KeySharesVersion::V3, KeySharesVersion::V2] {
            let fixture = TestFixture::with_operators(&[1, 2, 3, 4], version);
            let key_shares = collection(&fixture, 2);
            assert_eq!(key_shares.len(), 2);

            let bytes = key_shares.serialize().expect("Failed to serialize");
            let restored = KeyShares::deserialize(&bytes).expect("Failed to deserialize");
            assert_eq!(restored, key_shares);
            assert_eq!(restored.version(), version);
            restored.items().iter().for_each(assertions::item_is_consistent);
        }
    }

    #[test]
    fn test_document_layout() {
        let fixture = TestFixture::new();
        let bytes = collection(&fixture, 1).serialize().unwrap();
        let document: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(document["version"], json!("v3"));
        assert_eq!(document["shares"].as_array().unwrap().len(), 1);
        assert_eq!(document["shares"][0]["data"]["ownerNonce"], json!(0));
    }

    #[test]
    fn test_add_rejects_mismatched_items() {
        let fixture = TestFixture::new();
        let mut key_shares = KeyShares::new(KeySharesVersion::V2);
        assert!(matches!(
            key_shares.add(fixture.item(&generators::context::deposit())),
            Err(KeySharesError::UnsupportedVersion(_))
        ));

        let mut key_shares = KeyShares::new(KeySharesVersion::V3);
        assert_eq!(
            key_shares.add(KeySharesItem::new(KeySharesVersion::V3)),
            Err(KeySharesError::MissingField("operators".to_string()))
        );
        assert!(key_shares.is_empty());
    }

    #[test]
    fn test_unsupported_version() {
        let fixture = TestFixture::new();
        let bytes = collection(&fixture, 1).serialize().unwrap();

        let future = assertions::edit_document(&bytes, |document| {
            document["version"] = json!("v9");
        });
        assert_eq!(
            KeyShares::deserialize(&future).unwrap_err(),
            KeySharesError::UnsupportedVersion("v9".to_string())
        );

        let missing = assertions::edit_document(&bytes, |document| {
            document.as_object_mut().unwrap().remove("version");
        });
        assert_eq!(
            KeyShares::deserialize(&missing).unwrap_err(),
            KeySharesError::MissingField("version".to_string())
        );

        // A v3 document read as v2 lacks the legacy operator fields
        let relabelled = assertions::edit_document(&bytes, |document| {
            document["version"] = json!("v2");
        });
        assert!(matches!(
            KeyShares::deserialize(&relabelled),
            Err(KeySharesError::InvalidItem { index: 0, .. })
        ));
    }

    #[test]
    // The second item has two share keys for three operators
    fn test_invalid_item_reports_index() {
        let fixture = TestFixture::with_operators(&[2, 4, 6], KeySharesVersion::V3);
        let bytes = collection(&fixture, 3).serialize().unwrap();
        let broken = assertions::edit_document(&bytes, |document| {
            document["shares"][1]["data"]["shares"]["publicKeys"]
                .as_array_mut()
                .unwrap()
                .pop();
        });

        match KeyShares::deserialize(&broken) {
            Err(KeySharesError::InvalidItem { index, error }) => {
                assert_eq!(index, 1);
                assert!(matches!(
                    *error,
                    KeySharesError::ArrayShape { ref field, .. } if field == "shares.publicKeys"
                ));
            }
            other => panic!("Expected an invalid item, got {other:?}"),
        }

        // Loading into an existing collection keeps what was there
        let mut existing = collection(&fixture, 1);
        let before = existing.clone();
        assert!(existing.load(&broken).is_err());
        assert_eq!(existing, before);
    }

    #[test]
    fn test_load_merges_documents() {
        let fixture = TestFixture::new();
        let mut key_shares = collection(&fixture, 1);
        let other = collection(&fixture, 2);

        let added = key_shares
            .load(&other.serialize().unwrap())
            .expect("Failed to load");
        assert_eq!(added, 2);
        assert_eq!(key_shares.len(), 3);
        assert_eq!(&key_shares.items()[1..], other.items());

        // Documents of another version are not merged
        let legacy = TestFixture::with_operators(&[1, 2, 3, 4], KeySharesVersion::V2);
        let legacy_bytes = collection(&legacy, 1).serialize().unwrap();
        assert!(matches!(
            key_shares.load(&legacy_bytes),
            Err(KeySharesError::UnsupportedVersion(_))
        ));
        assert_eq!(key_shares.len(), 3);
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let fixture = TestFixture::new();
        let bytes = collection(&fixture, 2).serialize().unwrap();
        let tampered = assertions::edit_document(&bytes, |document| {
            document["shares"][1]["payload"]["readable"]["ownerNonce"] = json!(42);
            document["shares"][1]["data"]["ownerNonce"] = json!(42);
        });

        match KeyShares::deserialize(&tampered) {
            Err(KeySharesError::InvalidItem { index: 1, error }) => {
                assert!(matches!(*error, KeySharesError::PayloadMismatch(_)))
            }
            other => panic!("Expected a payload mismatch, got {other:?}"),
        }

        let not_array = assertions::edit_document(&bytes, |document| {
            document["shares"] = json!({"data": {}});
        });
        assert!(matches!(
            KeyShares::deserialize(&not_array),
            Err(KeySharesError::ArrayShape { field, .. }) if field == "shares"
        ));
    }
}
