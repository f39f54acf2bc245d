use crate::item::{operators_data, shares_data};
use crate::reporter::{BuildStep, Reporter};
use crate::{ItemUpdate, KeySharesError, KeySharesItem, KeySharesVersion};
use payload::PayloadContext;
use ssv_types::{Operator, OperatorId, ValidatorKeyMaterial};
use tracing::instrument;

/// Turns validator keystores into complete key-shares items for a fixed committee.
///
/// Builds share nothing mutable, so one builder can serve many keystores in parallel.
#[derive(Debug, Clone)]
pub struct KeySharesBuilder {
    version: KeySharesVersion,
    operators: Vec<Operator>,
}

impl KeySharesBuilder {
    pub fn new(version: KeySharesVersion, operators: Vec<Operator>) -> Self {
        Self { version, operators }
    }

    /// Builder for operators given as parallel id and encoded key lists
    pub fn from_operator_keys(
        version: KeySharesVersion,
        operator_ids: &[OperatorId],
        operator_keys: &[String],
    ) -> Result<Self, KeySharesError> {
        let operators = threshold::parse_operators(operator_ids, operator_keys)?;
        Ok(Self::new(version, operators))
    }

    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    /// Decrypt a keystore and build its item
    pub fn build(
        &self,
        keystore_bytes: &[u8],
        password: &str,
        context: &PayloadContext,
        reporter: &dyn Reporter,
    ) -> Result<KeySharesItem, KeySharesError> {
        reporter.report(&BuildStep::DecryptingKeystore);
        let key_material = keystore::decrypt(keystore_bytes, password)?;
        self.build_from_key_material(key_material, context, reporter)
    }

    /// Split already decrypted key material. The material is dropped, and zeroed, on return.
    #[instrument(skip_all, fields(validator = %key_material.public_key()))]
    pub fn build_from_key_material(
        &self,
        key_material: ValidatorKeyMaterial,
        context: &PayloadContext,
        reporter: &dyn Reporter,
    ) -> Result<KeySharesItem, KeySharesError> {
        context.validate()?;
        reporter.report(&BuildStep::SplittingKey {
            operators: self.operators.len(),
        });
        let shares = threshold::split_and_encrypt(&key_material, &self.operators)?;
        let validator = *key_material.public_key();
        drop(key_material);
        reporter.report(&BuildStep::SharesEncrypted { validator });

        let mut item = KeySharesItem::new(self.version);
        item.apply_update(ItemUpdate::SetOperators {
            operators: operators_data(&self.operators),
            public_key: validator.as_hex_string(),
        })?;
        item.apply_update(ItemUpdate::SetShares {
            shares: shares_data(&shares),
        })?;

        reporter.report(&BuildStep::AssemblingPayload { validator });
        item.build_payload(context)?;

        reporter.report(&BuildStep::Completed { validator });
        Ok(item)
    }
}
