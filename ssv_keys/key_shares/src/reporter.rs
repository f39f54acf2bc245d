use ssv_types::BlsPublicKey;
use std::fmt::Display;
use tracing::{debug, info};

/// Progress of a single key-shares build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStep {
    DecryptingKeystore,
    SplittingKey { operators: usize },
    SharesEncrypted { validator: BlsPublicKey },
    AssemblingPayload { validator: BlsPublicKey },
    Completed { validator: BlsPublicKey },
}

impl Display for BuildStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DecryptingKeystore => write!(f, "Decrypting keystore"),
            Self::SplittingKey { operators } => {
                write!(f, "Splitting key across {operators} operators")
            }
            Self::SharesEncrypted { validator } => write!(f, "Encrypted shares of {validator}"),
            Self::AssemblingPayload { validator } => {
                write!(f, "Assembling payload for {validator}")
            }
            Self::Completed { validator } => write!(f, "Built key shares for {validator}"),
        }
    }
}

/// Receives progress events from builds, which may run on several threads at once
pub trait Reporter: Send + Sync {
    fn report(&self, step: &BuildStep);
}

/// Forwards progress to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, step: &BuildStep) {
        match step {
            BuildStep::Completed { .. } => info!("{step}"),
            _ => debug!("{step}"),
        }
    }
}

/// Discards progress
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn report(&self, _step: &BuildStep) {}
}
