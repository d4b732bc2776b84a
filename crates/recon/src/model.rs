use std::collections::BTreeMap;

use serde::Serialize;
use treesync_core::{CanonicalTreeRecord, TreeField, TreeId};

// ---------------------------------------------------------------------------
// Sides
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Freshly loaded and converted records.
    Incoming,
    /// Records currently persisted for the source.
    Snapshot,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Incoming => write!(f, "incoming"),
            Self::Snapshot => write!(f, "snapshot"),
        }
    }
}

// ---------------------------------------------------------------------------
// Key matching
// ---------------------------------------------------------------------------

/// An incoming record and the snapshot record with the same key.
#[derive(Debug, Clone, Copy)]
pub struct MatchedPair<'a> {
    pub incoming: &'a CanonicalTreeRecord,
    pub snapshot: &'a CanonicalTreeRecord,
}

#[derive(Debug)]
pub struct PairMatchOutput<'a> {
    pub matched: Vec<MatchedPair<'a>>,
    pub incoming_only: Vec<&'a CanonicalTreeRecord>,
    pub snapshot_only: Vec<&'a CanonicalTreeRecord>,
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// An incoming record whose stored counterpart differs in at least one
/// comparable field.
#[derive(Debug, Clone, Serialize)]
pub struct RecordUpdate {
    pub record: CanonicalTreeRecord,
    /// Id of the stored row; it stays the row's id after the update.
    pub existing_id: TreeId,
    pub changed: Vec<TreeField>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconSummary {
    pub incoming: usize,
    pub snapshot: usize,
    pub deleted: usize,
    pub updated: usize,
    pub added: usize,
    pub unchanged: usize,
    /// How many updates touch each column.
    pub field_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub engine_version: String,
    pub run_at: String,
}

/// The storage mutations needed to bring a snapshot in line with the
/// incoming set. A matched pair without differences appears in no list.
#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub deleted: Vec<CanonicalTreeRecord>,
    pub updated: Vec<RecordUpdate>,
    pub added: Vec<CanonicalTreeRecord>,
}

impl ReconResult {
    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty() && self.updated.is_empty() && self.added.is_empty()
    }

    pub fn deleted_ids(&self) -> Vec<TreeId> {
        self.deleted.iter().map(|r| r.id.clone()).collect()
    }
}
