//! `treesync sync`: load one source and reconcile it into the tree table.

use serde::Serialize;
use thiserror::Error;
use tracing::{info, info_span};
use treesync_core::CoordinateOrder;
use treesync_io::{ClassificationWarning, Converter, LoadError, LoadingStrategy, SqliteStore};
use treesync_recon::driver::read_snapshot;
use treesync_recon::{apply, reconcile, AppliedCounts, ReconError, ReconResult, StoreError};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("loading failed: {0}")]
    Load(#[from] LoadError),

    #[error(transparent)]
    Recon(#[from] ReconError),

    #[error("store failed: {0}")]
    Store(#[from] StoreError),
}

/// Everything one run needs besides the store.
#[derive(Debug, Clone)]
pub struct SyncPlan {
    pub source: String,
    pub strategy: LoadingStrategy,
    pub coordinate_order: CoordinateOrder,
    /// Reconcile only; nothing is applied or committed.
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
pub struct SyncReport {
    pub source: String,
    pub strategy: String,
    pub dry_run: bool,
    pub loaded: usize,
    pub warnings: Vec<ClassificationWarning>,
    /// `None` on a dry run.
    pub applied: Option<AppliedCounts>,
    pub result: ReconResult,
}

impl SyncReport {
    /// `Deleted: n / Updated: n / Added: n` as planned (dry run) or applied.
    pub fn summary_lines(&self) -> [String; 3] {
        let (deleted, updated, added) = match &self.applied {
            Some(c) => (c.deleted, c.updated, c.added),
            None => (
                self.result.summary.deleted,
                self.result.summary.updated,
                self.result.summary.added,
            ),
        };
        [
            format!("Deleted: {deleted}"),
            format!("Updated: {updated}"),
            format!("Added: {added}"),
        ]
    }
}

/// Load → convert → read snapshot → reconcile → apply.
///
/// All mutations run in one SQLite transaction; any failure leaves the store
/// as it was. Loader and duplicate-key failures happen before the store is
/// touched at all.
pub fn run(plan: &SyncPlan, store: &mut SqliteStore) -> Result<SyncReport, SyncError> {
    let span = info_span!("sync", source = %plan.source);
    let _enter = span.enter();

    let trees = plan.strategy.load()?;
    let loaded = trees.len();
    info!(strategy = %plan.strategy, loaded, "loaded trees");

    let conversion = Converter::new(plan.source.clone(), plan.coordinate_order).convert(trees);

    let mut tx = store.transaction()?;
    let snapshot = read_snapshot(&mut tx, &plan.source)?;
    let result = reconcile(&conversion.records, &snapshot)?;

    let applied = if plan.dry_run {
        info!("dry run, store left untouched");
        None
    } else {
        let counts = apply(&mut tx, &result)?;
        tx.commit()?;
        Some(counts)
    };

    Ok(SyncReport {
        source: plan.source.clone(),
        strategy: plan.strategy.to_string(),
        dry_run: plan.dry_run,
        loaded,
        warnings: conversion.warnings,
        applied,
        result,
    })
}
