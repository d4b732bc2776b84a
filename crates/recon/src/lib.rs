//! `treesync-recon`: reconciles a freshly loaded tree set against the
//! persisted snapshot of the same source.
//!
//! The engine is pure: records in, delete/update/insert sets out. Applying
//! those sets goes through [`driver::apply`] and a [`SnapshotStore`].

pub mod compare;
pub mod driver;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod matcher;
pub mod model;

pub use driver::{apply, AppliedCounts, MutationStep, SnapshotStore};
pub use engine::reconcile;
pub use error::{ReconError, StoreError};
pub use model::{ReconResult, ReconSummary, RecordUpdate, Side};
