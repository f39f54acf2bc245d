use crate::PayloadError;
use alloy::primitives::{Address, U256};

/// Owner of the registered validator together with their registration nonce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerContext {
    pub address: Address,
    pub nonce: u64,
}

/// Call context fields appended to the payload parameters.
///
/// At least one of the owner or the token amount has to be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PayloadContext {
    pub owner: Option<OwnerContext>,
    pub amount: Option<U256>,
}

impl PayloadContext {
    pub fn registration(address: Address, nonce: u64) -> Self {
        Self {
            owner: Some(OwnerContext { address, nonce }),
            amount: None,
        }
    }

    pub fn deposit(amount: U256) -> Self {
        Self {
            owner: None,
            amount: Some(amount),
        }
    }

    pub fn with_owner(mut self, address: Address, nonce: u64) -> Self {
        self.owner = Some(OwnerContext { address, nonce });
        self
    }

    pub fn with_amount(mut self, amount: U256) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Rebuild a context from the optional fields of a document
    pub fn from_parts(
        owner_address: Option<Address>,
        owner_nonce: Option<u64>,
        amount: Option<U256>,
    ) -> Result<Self, PayloadError> {
        let owner = match (owner_address, owner_nonce) {
            (Some(address), Some(nonce)) => Some(OwnerContext { address, nonce }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(PayloadError::MissingContext(
                    "Owner address given without a nonce".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(PayloadError::MissingContext(
                    "Owner nonce given without an address".to_string(),
                ))
            }
        };
        let context = Self { owner, amount };
        context.validate()?;
        Ok(context)
    }

    pub fn validate(&self) -> Result<(), PayloadError> {
        if self.owner.is_none() && self.amount.is_none() {
            return Err(PayloadError::MissingContext(
                "Either an owner or a token amount is required".to_string(),
            ));
        }
        Ok(())
    }
}
