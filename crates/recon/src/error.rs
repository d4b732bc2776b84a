use thiserror::Error;
use treesync_core::RecordKey;

use crate::driver::MutationStep;
use crate::model::Side;

#[derive(Debug, Error)]
pub enum ReconError {
    /// The same `(natural_key, source)` occurs twice on one side.
    #[error("duplicate key '{key}' in {side} records")]
    DuplicateKey { side: Side, key: RecordKey },
    /// A store operation failed. Later steps were not attempted.
    #[error("store failed during {step}: {cause}")]
    Store {
        step: MutationStep,
        #[source]
        cause: StoreError,
    },
}

/// Failure reported by a [`crate::SnapshotStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("{0}")]
    Message(String),
}

impl StoreError {
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }
}
