use super::test_prelude::*;
use keystore::{KdfKind, Keystore};
use openssl::pkey::Private;
use openssl::rsa::Rsa;

const DEFAULT_OPERATOR_IDS: [u64; 4] = [1, 2, 3, 4];
const RSA_KEY_SIZE: u32 = 2048;
pub const PASSWORD: &str = "testpassword🔑";
pub const AMOUNT: u64 = 123456789;

// Test fixture for common scenarios
pub struct TestFixture {
    pub version: KeySharesVersion,
    pub builder: KeySharesBuilder,
    pub operators: Vec<Operator>,
    pub private_keys: Vec<Rsa<Private>>,
    pub keystore: Vec<u8>,
    pub validator: BlsPublicKey,
    pub secret: [u8; SECRET_KEY_LENGTH],
}

impl TestFixture {
    // A v3 committee of four operators and one keystore
    pub fn new() -> Self {
        Self::with_operators(&DEFAULT_OPERATOR_IDS, KeySharesVersion::V3)
    }

    // Operators are kept in the order given
    pub fn with_operators(ids: &[u64], version: KeySharesVersion) -> Self {
        let (operators, private_keys) = generators::operators(ids);
        let key_material = generators::key_material();
        let keystore = generators::keystore(&key_material, PASSWORD);

        Self {
            version,
            builder: KeySharesBuilder::new(version, operators.clone()),
            operators,
            private_keys,
            keystore,
            validator: *key_material.public_key(),
            secret: *key_material.secret().serialize(),
        }
    }

    // Build a complete item for the fixture keystore
    pub fn item(&self, context: &PayloadContext) -> KeySharesItem {
        self.builder
            .build(&self.keystore, PASSWORD, context, &NoopReporter)
            .expect("Failed to build item")
    }

    // An item that has operators and shares but no payload yet
    pub fn item_without_payload(&self) -> KeySharesItem {
        generators::without_payload(&self.item(&generators::context::deposit()))
    }
}

// Generator functions for test data
pub mod generators {
    use super::*;
    use rand::RngCore;

    // Random validator key material
    pub fn key_material() -> ValidatorKeyMaterial {
        let mut bytes = [0u8; SECRET_KEY_LENGTH];
        rand::thread_rng().fill_bytes(&mut bytes[1..]);
        // keep the value well below the group order
        bytes[1] &= 0x3f;
        ValidatorKeyMaterial::new(SecretKey::deserialize(&bytes).expect("Invalid secret"))
    }

    // Operators with fresh RSA keys, along with the private halves
    pub fn operators(ids: &[u64]) -> (Vec<Operator>, Vec<Rsa<Private>>) {
        ids.iter()
            .map(|id| {
                let private = Rsa::generate(RSA_KEY_SIZE).expect("Failed to generate RSA key");
                let public = private
                    .public_key_to_pem()
                    .and_then(|pem| Rsa::public_key_from_pem(&pem))
                    .expect("Failed to process RSA key");
                let operator = Operator::new_with_pubkey(public, OperatorId(*id))
                    .expect("Failed to create operator");
                (operator, private)
            })
            .unzip()
    }

    // Keystore JSON with a cheap KDF
    pub fn keystore(key_material: &ValidatorKeyMaterial, password: &str) -> Vec<u8> {
        Keystore::encrypt(
            key_material,
            password,
            KdfKind::Pbkdf2 { rounds: 1024 },
            "m/12381/3600/0/0/0",
        )
        .and_then(|keystore| keystore.to_json_string())
        .expect("Failed to create keystore")
        .into_bytes()
    }

    // Copy of an item with its payload left out
    pub fn without_payload(built: &KeySharesItem) -> KeySharesItem {
        let mut item = KeySharesItem::new(built.version());
        item.apply_update(ItemUpdate::SetOperators {
            operators: operators_data(built.operators()),
            public_key: built
                .validator_pubkey()
                .expect("Item has a validator")
                .as_hex_string(),
        })
        .expect("Failed to set operators");
        item.apply_update(ItemUpdate::SetShares {
            shares: shares_data(built.shares()),
        })
        .expect("Failed to set shares");
        item
    }

    pub mod context {
        use super::*;

        pub fn deposit() -> PayloadContext {
            PayloadContext::deposit(U256::from(AMOUNT))
        }

        pub fn registration(nonce: u64) -> PayloadContext {
            PayloadContext::registration(Address::repeat_byte(0x11), nonce)
        }
    }
}

// Helpers to check and manipulate documents
pub mod assertions {
    use super::*;

    // Every invariant of a complete item
    pub fn item_is_consistent(item: &KeySharesItem) {
        assert_eq!(item.operators().len(), item.shares().len());
        for (operator, share) in item.operators().iter().zip(item.shares()) {
            assert_eq!(operator.id, share.operator_id);
        }

        if let Some(payload) = item.payload() {
            let ids: Vec<u64> = item.operator_ids().iter().map(|id| **id).collect();
            assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
            assert_eq!(payload.readable.operator_ids, ids);

            let decoded = payload.decode().expect("Failed to decode payload");
            assert_eq!(decoded.operator_ids, ids);
            assert_eq!(decoded.share_public_keys, payload.readable.share_public_keys);
            assert_eq!(decoded.shares_encrypted, payload.readable.shares_encrypted);
        }
    }

    // Apply `edit` to the JSON form of a document
    pub fn edit_document(bytes: &[u8], edit: impl FnOnce(&mut Value)) -> Vec<u8> {
        let mut document: Value = serde_json::from_slice(bytes).expect("Invalid document");
        edit(&mut document);
        serde_json::to_vec(&document).expect("Failed to serialize document")
    }
}
