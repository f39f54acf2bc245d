//! Versioned key-shares documents: per-validator items with validated updates, collections of
//! items, and the pipeline that builds an item from a keystore.

pub use builder::KeySharesBuilder;
pub use collection::KeyShares;
pub use document::{OperatorData, SharesData};
pub use error::KeySharesError;
pub use item::{operators_data, shares_data, ItemUpdate, KeySharesItem};
pub use reporter::{BuildStep, NoopReporter, Reporter, TracingReporter};
pub use version::KeySharesVersion;

mod builder;
mod collection;
mod document;
mod error;
mod item;
mod reporter;
mod version;

#[cfg(test)]
mod tests;
