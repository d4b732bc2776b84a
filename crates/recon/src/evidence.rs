use std::collections::BTreeMap;

use crate::model::{RecordUpdate, ReconSummary};

/// Compute summary statistics for a classified run.
pub fn compute_summary(
    incoming: usize,
    snapshot: usize,
    deleted: usize,
    updated: &[RecordUpdate],
    added: usize,
    unchanged: usize,
) -> ReconSummary {
    let mut field_counts: BTreeMap<String, usize> = BTreeMap::new();
    for update in updated {
        for field in &update.changed {
            *field_counts.entry(field.column().to_string()).or_insert(0) += 1;
        }
    }

    ReconSummary {
        incoming,
        snapshot,
        deleted,
        updated: updated.len(),
        added,
        unchanged,
        field_counts,
    }
}
