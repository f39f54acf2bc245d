use crate::document::DocumentFragment;
use crate::{KeySharesError, KeySharesItem, KeySharesVersion};
use serde_json::Value;
use tracing::{debug, warn};

/// An ordered set of key-shares items, the unit that is persisted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyShares {
    version: KeySharesVersion,
    items: Vec<KeySharesItem>,
}

impl KeyShares {
    pub fn new(version: KeySharesVersion) -> Self {
        Self {
            version,
            items: Vec::new(),
        }
    }

    pub fn version(&self) -> KeySharesVersion {
        self.version
    }

    /// Append a complete item of the collection's version
    pub fn add(&mut self, item: KeySharesItem) -> Result<(), KeySharesError> {
        if item.version() != self.version {
            return Err(KeySharesError::UnsupportedVersion(format!(
                "item version {} does not match collection version {}",
                item.version(),
                self.version
            )));
        }
        if item.operators().is_empty() {
            return Err(KeySharesError::MissingField("operators".to_string()));
        }
        if item.shares().is_empty() {
            return Err(KeySharesError::MissingField("shares".to_string()));
        }
        self.items.push(item);
        Ok(())
    }

    pub fn items(&self) -> &[KeySharesItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Pretty printed JSON document
    pub fn serialize(&self) -> Result<Vec<u8>, KeySharesError> {
        let document = DocumentFragment {
            version: self.version.as_str(),
            shares: self.items.iter().map(KeySharesItem::to_fragment).collect(),
        };
        Ok(serde_json::to_vec_pretty(&document)?)
    }

    /// Parse and re-validate a document. Fails on the first invalid item.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, KeySharesError> {
        let document: Value = serde_json::from_slice(bytes)?;
        let version = document
            .get("version")
            .ok_or_else(|| KeySharesError::MissingField("version".to_string()))?
            .as_str()
            .ok_or_else(|| KeySharesError::UnsupportedVersion("version is not a string".to_string()))?
            .parse::<KeySharesVersion>()?;
        let entries = document
            .get("shares")
            .ok_or_else(|| KeySharesError::MissingField("shares".to_string()))?
            .as_array()
            .ok_or_else(|| KeySharesError::ArrayShape {
                field: "shares".to_string(),
                reason: "expected an array".to_string(),
            })?;

        let mut key_shares = Self::new(version);
        for (index, entry) in entries.iter().enumerate() {
            KeySharesItem::from_value(version, entry)
                .and_then(|item| key_shares.add(item))
                .map_err(|error| {
                    warn!(index, %error, "Rejected key-shares item");
                    KeySharesError::InvalidItem {
                        index,
                        error: Box::new(error),
                    }
                })?;
        }

        debug!(%version, items = key_shares.len(), "Loaded key-shares document");
        Ok(key_shares)
    }

    /// Merge the items of a document into this collection.
    ///
    /// The document is validated completely before anything is added, so on error the existing
    /// items are untouched. Returns the number of items added.
    pub fn load(&mut self, bytes: &[u8]) -> Result<usize, KeySharesError> {
        let loaded = Self::deserialize(bytes)?;
        if loaded.version != self.version {
            return Err(KeySharesError::UnsupportedVersion(format!(
                "document version {} does not match collection version {}",
                loaded.version, self.version
            )));
        }
        let added = loaded.items.len();
        self.items.extend(loaded.items);
        Ok(added)
    }
}
