//! Applies a [`ReconResult`] to a snapshot store.
//!
//! Order is fixed: dependents of deleted trees, deleted trees, updates,
//! inserts. A failing step stops the sequence. Steps already applied stay
//! applied; callers wanting atomicity hand in a transactional store.

use serde::Serialize;
use tracing::{debug, info};
use treesync_core::{CanonicalTreeRecord, TreeId};

use crate::error::{ReconError, StoreError};
use crate::model::ReconResult;

/// Persisted tree table, scoped by source.
///
/// Every bulk operation must accept an empty slice and do nothing.
pub trait SnapshotStore {
    /// All stored records of one source.
    fn read_snapshot(&mut self, source: &str) -> Result<Vec<CanonicalTreeRecord>, StoreError>;

    /// Remove adoption and watering records referencing `ids`.
    fn delete_dependents(&mut self, ids: &[TreeId]) -> Result<(), StoreError>;

    /// Remove trees by id.
    fn delete(&mut self, ids: &[TreeId]) -> Result<(), StoreError>;

    /// Overwrite comparable fields and geometry of the rows matching each
    /// record's `(natural_key, source)`. Stored ids are kept.
    fn update(&mut self, records: &[CanonicalTreeRecord]) -> Result<(), StoreError>;

    /// Insert new rows with their own ids.
    fn insert(&mut self, records: &[CanonicalTreeRecord]) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationStep {
    ReadSnapshot,
    DeleteDependents,
    Delete,
    Update,
    Insert,
}

impl std::fmt::Display for MutationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadSnapshot => write!(f, "read_snapshot"),
            Self::DeleteDependents => write!(f, "delete_dependents"),
            Self::Delete => write!(f, "delete"),
            Self::Update => write!(f, "update"),
            Self::Insert => write!(f, "insert"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AppliedCounts {
    pub deleted: usize,
    pub updated: usize,
    pub added: usize,
}

fn at(step: MutationStep) -> impl FnOnce(StoreError) -> ReconError {
    move |cause| ReconError::Store { step, cause }
}

/// Read the snapshot of `source`, mapping failures to [`ReconError::Store`].
pub fn read_snapshot<S: SnapshotStore + ?Sized>(
    store: &mut S,
    source: &str,
) -> Result<Vec<CanonicalTreeRecord>, ReconError> {
    let records = store
        .read_snapshot(source)
        .map_err(at(MutationStep::ReadSnapshot))?;
    debug!(source, records = records.len(), "read snapshot");
    Ok(records)
}

/// Apply `result` to `store` in dependency-safe order.
pub fn apply<S: SnapshotStore + ?Sized>(
    store: &mut S,
    result: &ReconResult,
) -> Result<AppliedCounts, ReconError> {
    let deleted_ids = result.deleted_ids();

    store
        .delete_dependents(&deleted_ids)
        .map_err(at(MutationStep::DeleteDependents))?;
    store
        .delete(&deleted_ids)
        .map_err(at(MutationStep::Delete))?;
    debug!(count = deleted_ids.len(), "deleted trees and their dependents");

    let updates: Vec<CanonicalTreeRecord> =
        result.updated.iter().map(|u| u.record.clone()).collect();
    store
        .update(&updates)
        .map_err(at(MutationStep::Update))?;
    debug!(count = updates.len(), "updated trees");

    store
        .insert(&result.added)
        .map_err(at(MutationStep::Insert))?;
    debug!(count = result.added.len(), "inserted trees");

    let counts = AppliedCounts {
        deleted: deleted_ids.len(),
        updated: updates.len(),
        added: result.added.len(),
    };
    info!(
        deleted = counts.deleted,
        updated = counts.updated,
        added = counts.added,
        "applied reconciliation"
    );
    Ok(counts)
}
