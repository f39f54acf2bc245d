use crate::document::{
    detect_version, parse_item, DataFragment, ItemFragment, OperatorData, SharesData,
};
use crate::{KeySharesError, KeySharesVersion};
use payload::{encrypted_key_from_hex, encrypted_key_to_hex, Payload, PayloadContext};
use serde_json::Value;
use ssv_types::{BlsPublicKey, Operator, OperatorId, Share, MAX_OPERATORS};
use std::collections::HashSet;
use std::str::FromStr;
use tracing::{debug, trace};

/// A partial update of an item, carrying document level values that are validated on apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemUpdate {
    /// Set the operator committee and the validator it serves
    SetOperators {
        operators: Vec<OperatorData>,
        public_key: String,
    },
    /// Set the shares, aligned with the current operators
    SetShares { shares: SharesData },
    /// Attach a payload that must agree with the operators and shares
    SetPayload { payload: Payload },
}

/// One validator's entry in a key-shares document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySharesItem {
    version: KeySharesVersion,
    operators: Vec<Operator>,
    validator_pubkey: Option<BlsPublicKey>,
    shares: Vec<Share>,
    payload: Option<Payload>,
}

impl KeySharesItem {
    /// An empty item that only carries its version
    pub fn new(version: KeySharesVersion) -> Self {
        Self {
            version,
            operators: Vec::new(),
            validator_pubkey: None,
            shares: Vec::new(),
            payload: None,
        }
    }

    pub fn version(&self) -> KeySharesVersion {
        self.version
    }

    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    pub fn operator_ids(&self) -> Vec<OperatorId> {
        self.operators.iter().map(|op| op.id).collect()
    }

    pub fn validator_pubkey(&self) -> Option<&BlsPublicKey> {
        self.validator_pubkey.as_ref()
    }

    pub fn shares(&self) -> &[Share] {
        &self.shares
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    /// Operators and shares are both present
    pub fn is_complete(&self) -> bool {
        self.validator_pubkey.is_some() && !self.shares.is_empty()
    }

    /// Validate and apply an update. On error the item is left unchanged.
    pub fn apply_update(&mut self, update: ItemUpdate) -> Result<(), KeySharesError> {
        let mut staged = self.clone();
        staged.stage(update)?;
        *self = staged;
        Ok(())
    }

    fn stage(&mut self, update: ItemUpdate) -> Result<(), KeySharesError> {
        match update {
            ItemUpdate::SetOperators {
                operators,
                public_key,
            } => {
                let operators = validate_operators(&operators)?;
                let validator_pubkey =
                    BlsPublicKey::from_str(&public_key).map_err(|reason| {
                        KeySharesError::InvalidPublicKey {
                            field: "publicKey".to_string(),
                            reason,
                        }
                    })?;

                // Shares and payload belong to a specific committee and validator
                if operators != self.operators || Some(validator_pubkey) != self.validator_pubkey
                {
                    self.shares.clear();
                    self.payload = None;
                }
                trace!(operators = operators.len(), "Staged operators");
                self.operators = operators;
                self.validator_pubkey = Some(validator_pubkey);
            }
            ItemUpdate::SetShares { shares } => {
                self.shares = self.validate_shares(&shares)?;
                self.payload = None;
                trace!(shares = self.shares.len(), "Staged shares");
            }
            ItemUpdate::SetPayload { payload } => {
                self.validate_payload(&payload)?;
                self.payload = Some(payload);
                trace!("Staged payload");
            }
        }
        Ok(())
    }

    fn validate_shares(&self, shares: &SharesData) -> Result<Vec<Share>, KeySharesError> {
        let validator_pubkey = self.require_validator()?;
        let operator_count = self.operators.len();

        for (field, len) in [
            ("shares.publicKeys", shares.public_keys.len()),
            ("shares.encryptedKeys", shares.encrypted_keys.len()),
        ] {
            if len != operator_count {
                return Err(KeySharesError::ArrayShape {
                    field: field.to_string(),
                    reason: format!("expected {operator_count} entries, got {len}"),
                });
            }
        }

        let shares = self
            .operators
            .iter()
            .zip(shares.public_keys.iter().zip(&shares.encrypted_keys))
            .enumerate()
            .map(|(index, (operator, (public_key, encrypted_key)))| {
                let share_pubkey = BlsPublicKey::from_str(public_key).map_err(|reason| {
                    KeySharesError::InvalidPublicKey {
                        field: format!("shares.publicKeys[{index}]"),
                        reason,
                    }
                })?;
                let encrypted_private_key =
                    encrypted_key_from_hex(encrypted_key).map_err(|e| {
                        KeySharesError::InvalidEncryptedShare {
                            index,
                            reason: e.to_string(),
                        }
                    })?;
                Ok(Share {
                    operator_id: operator.id,
                    share_pubkey,
                    encrypted_private_key,
                })
            })
            .collect::<Result<Vec<_>, KeySharesError>>()?;

        let share_pubkeys: Vec<_> = shares
            .iter()
            .map(|share| (share.operator_id, share.share_pubkey))
            .collect();
        threshold::verify_share_public_keys(validator_pubkey, &share_pubkeys).map_err(|e| {
            KeySharesError::InvalidPublicKey {
                field: "shares.publicKeys".to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(shares)
    }

    fn validate_payload(&self, payload: &Payload) -> Result<(), KeySharesError> {
        let validator_pubkey = self.require_validator()?;
        if self.shares.is_empty() {
            return Err(KeySharesError::MissingField("shares".to_string()));
        }

        let rebuilt = payload::build(
            validator_pubkey,
            &self.operator_ids(),
            &self.shares,
            &payload.context()?,
        )?;
        if rebuilt.readable != payload.readable {
            return Err(KeySharesError::PayloadMismatch(
                "Readable payload differs from the item's operators and shares".to_string(),
            ));
        }
        if rebuilt.raw != payload.raw {
            return Err(KeySharesError::PayloadMismatch(
                "Raw payload differs from its readable form".to_string(),
            ));
        }
        Ok(())
    }

    fn require_validator(&self) -> Result<&BlsPublicKey, KeySharesError> {
        match &self.validator_pubkey {
            Some(pubkey) if !self.operators.is_empty() => Ok(pubkey),
            _ => Err(KeySharesError::MissingField("operators".to_string())),
        }
    }

    /// Assemble the payload for this item and store it.
    ///
    /// Operators and shares are sorted ascending by operator id first.
    pub fn build_payload(&mut self, context: &PayloadContext) -> Result<&Payload, KeySharesError> {
        let validator_pubkey = *self.require_validator()?;
        if self.shares.is_empty() {
            return Err(KeySharesError::MissingField("shares".to_string()));
        }

        let mut pairs: Vec<(Operator, Share)> = self
            .operators
            .iter()
            .cloned()
            .zip(self.shares.iter().cloned())
            .collect();
        pairs.sort_by_key(|(operator, _)| operator.id);
        let (operators, shares): (Vec<Operator>, Vec<Share>) = pairs.into_iter().unzip();
        let operator_ids: Vec<OperatorId> = operators.iter().map(|op| op.id).collect();

        let payload = payload::build(&validator_pubkey, &operator_ids, &shares, context)?;
        debug!(validator = %validator_pubkey, "Built payload for item");

        self.operators = operators;
        self.shares = shares;
        Ok(&*self.payload.insert(payload))
    }

    /// Canonical JSON form of the item, tagged with its version
    pub fn to_document_fragment(&self) -> Result<Vec<u8>, KeySharesError> {
        let fragment = ItemFragment {
            version: Some(self.version.as_str()),
            ..self.to_fragment()
        };
        Ok(serde_json::to_vec(&fragment)?)
    }

    /// Parse and fully validate an item.
    ///
    /// The schema version is read from the fragment's `version` key. Untagged fragments are v2
    /// when they carry `operatorIds`/`operatorPublicKeys` and v3 otherwise.
    pub fn from_document_fragment(bytes: &[u8]) -> Result<Self, KeySharesError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(detect_version(&value)?, &value)
    }

    pub(crate) fn to_fragment(&self) -> ItemFragment {
        let mut data = DataFragment {
            public_key: self.validator_pubkey.map(|pk| pk.as_hex_string()),
            ..Default::default()
        };

        if !self.operators.is_empty() {
            let operators = operators_data(&self.operators);
            match self.version {
                KeySharesVersion::V3 => data.operators = Some(operators),
                KeySharesVersion::V2 => {
                    let (ids, keys) = operators
                        .into_iter()
                        .map(|op| (op.id, op.public_key))
                        .unzip();
                    data.operator_ids = Some(ids);
                    data.operator_public_keys = Some(keys);
                }
            }
        }

        if !self.shares.is_empty() {
            data.shares = Some(shares_data(&self.shares));
        }

        if self.version == KeySharesVersion::V3 {
            let owner = self.payload.as_ref().map(|p| &p.readable);
            data.owner_address = owner.and_then(|r| r.owner_address);
            data.owner_nonce = owner.and_then(|r| r.owner_nonce);
        }

        ItemFragment {
            version: None,
            data,
            payload: self.payload.clone(),
        }
    }

    /// Rebuild an item through the same validators a caller's updates go through
    pub(crate) fn from_value(
        version: KeySharesVersion,
        value: &Value,
    ) -> Result<Self, KeySharesError> {
        let parsed = parse_item(version, value)?;
        let mut item = Self::new(version);

        match (parsed.operators, parsed.public_key) {
            (Some(operators), Some(public_key)) => item.apply_update(ItemUpdate::SetOperators {
                operators,
                public_key,
            })?,
            (None, None) => {}
            (Some(_), None) => return Err(KeySharesError::MissingField("publicKey".to_string())),
            (None, Some(_)) => {
                let field = match version {
                    KeySharesVersion::V3 => "operators",
                    KeySharesVersion::V2 => "operatorIds",
                };
                return Err(KeySharesError::MissingField(field.to_string()));
            }
        }

        if let Some(shares) = parsed.shares {
            item.apply_update(ItemUpdate::SetShares { shares })?;
        }

        if let Some(payload) = parsed.payload {
            let readable = &payload.readable;
            if parsed.owner_address.is_some_and(|a| Some(a) != readable.owner_address)
                || parsed.owner_nonce.is_some_and(|n| Some(n) != readable.owner_nonce)
            {
                return Err(KeySharesError::PayloadMismatch(
                    "Owner fields differ from the payload".to_string(),
                ));
            }
            item.apply_update(ItemUpdate::SetPayload { payload })?;
        }

        Ok(item)
    }
}

/// Document form of a list of shares
pub fn shares_data(shares: &[Share]) -> SharesData {
    SharesData {
        public_keys: shares
            .iter()
            .map(|share| share.share_pubkey.as_hex_string())
            .collect(),
        encrypted_keys: shares
            .iter()
            .map(|share| encrypted_key_to_hex(&share.encrypted_private_key))
            .collect(),
    }
}

/// Document form of a list of operators
pub fn operators_data(operators: &[Operator]) -> Vec<OperatorData> {
    operators
        .iter()
        .map(|op| OperatorData {
            id: *op.id,
            public_key: op.encoded_pubkey.clone(),
        })
        .collect()
}

fn validate_operators(operators: &[OperatorData]) -> Result<Vec<Operator>, KeySharesError> {
    if operators.is_empty() || operators.len() > MAX_OPERATORS {
        return Err(KeySharesError::ArrayShape {
            field: "operators".to_string(),
            reason: format!(
                "expected between 1 and {MAX_OPERATORS} operators, got {}",
                operators.len()
            ),
        });
    }

    let mut seen = HashSet::new();
    operators
        .iter()
        .map(|data| {
            let id = OperatorId(data.id);
            if data.id == 0 {
                return Err(KeySharesError::InvalidOperatorId(id));
            }
            if !seen.insert(id) {
                return Err(KeySharesError::Ordering(id));
            }
            Operator::new(&data.public_key, id)
                .map_err(|reason| KeySharesError::InvalidOperatorKey { id, reason })
        })
        .collect()
}
