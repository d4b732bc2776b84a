use std::time::Instant;

use tracing::debug;
use treesync_core::CanonicalTreeRecord;

use crate::compare::changed_fields;
use crate::error::ReconError;
use crate::evidence::compute_summary;
use crate::matcher::match_by_key;
use crate::model::{ReconMeta, ReconResult, RecordUpdate};

/// Compute the deletions, updates and insertions that bring `snapshot` in
/// line with `incoming`.
///
/// Both sides are expected to belong to the same source; the engine does not
/// filter, but keys carry the source so records of different sources never
/// match. Applying `deleted`, then `updated`, then `added` to the snapshot
/// yields the incoming set by key, with incoming field values.
///
/// `deleted` keeps snapshot order, `updated` and `added` keep incoming order.
pub fn reconcile(
    incoming: &[CanonicalTreeRecord],
    snapshot: &[CanonicalTreeRecord],
) -> Result<ReconResult, ReconError> {
    let started = Instant::now();
    let pairs = match_by_key(incoming, snapshot)?;
    debug!(
        matched = pairs.matched.len(),
        incoming_only = pairs.incoming_only.len(),
        snapshot_only = pairs.snapshot_only.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "matched records by key"
    );

    let mut updated = Vec::new();
    let mut unchanged = 0;
    for pair in &pairs.matched {
        let changed = changed_fields(pair.snapshot, pair.incoming);
        if changed.is_empty() {
            unchanged += 1;
            continue;
        }
        updated.push(RecordUpdate {
            record: pair.incoming.clone(),
            existing_id: pair.snapshot.id.clone(),
            changed,
        });
    }

    let deleted: Vec<CanonicalTreeRecord> = pairs.snapshot_only.into_iter().cloned().collect();
    let added: Vec<CanonicalTreeRecord> = pairs.incoming_only.into_iter().cloned().collect();

    let summary = compute_summary(
        incoming.len(),
        snapshot.len(),
        deleted.len(),
        &updated,
        added.len(),
        unchanged,
    );
    debug!(
        deleted = summary.deleted,
        updated = summary.updated,
        added = summary.added,
        unchanged = summary.unchanged,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "reconciliation done"
    );

    Ok(ReconResult {
        meta: ReconMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        deleted,
        updated,
        added,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use treesync_core::{TreeField, TreeId};

    fn tree(key: &str, source: &str, height: &str) -> CanonicalTreeRecord {
        CanonicalTreeRecord {
            id: TreeId::generate(),
            natural_key: key.into(),
            source: source.into(),
            lat: "52.13".into(),
            lng: "11.62".into(),
            common_name: Some("Eberesche (Vogelbeere)".into()),
            scientific_name: Some("Sorbus aucuparia".into()),
            genus_common: Some("Mehlbeeren".into()),
            genus: Some("Sorbus".into()),
            street: Some("Teststraße".into()),
            crown_diameter: Some("10".into()),
            trunk_girth: Some("31".into()),
            height: Some(height.into()),
            planting_year: Some(2020),
            geom: "SRID=4326;POINT(11.62 52.13)".into(),
        }
    }

    #[test]
    fn update_and_insert_scenario() {
        let snapshot = vec![tree("G1", "ls", "10")];
        let incoming = vec![tree("G1", "ls", "12"), tree("G2", "ls", "5")];
        let result = reconcile(&incoming, &snapshot).unwrap();

        assert!(result.deleted.is_empty());
        assert_eq!(result.updated.len(), 1);
        assert_eq!(result.updated[0].record.natural_key, "G1");
        assert_eq!(result.updated[0].record.height.as_deref(), Some("12"));
        assert_eq!(result.updated[0].existing_id, snapshot[0].id);
        assert_eq!(result.updated[0].changed, vec![TreeField::Height]);
        assert_eq!(result.added.len(), 1);
        assert_eq!(result.added[0].natural_key, "G2");
        assert_eq!(result.added[0].height.as_deref(), Some("5"));
    }

    #[test]
    fn empty_incoming_deletes_everything() {
        let snapshot = vec![tree("A", "ls", "10")];
        let result = reconcile(&[], &snapshot).unwrap();
        assert_eq!(result.deleted.len(), 1);
        assert_eq!(result.deleted[0].natural_key, "A");
        assert!(result.updated.is_empty());
        assert!(result.added.is_empty());
    }

    #[test]
    fn identical_sets_are_idempotent() {
        let records = vec![tree("G1", "ls", "10"), tree("G2", "ls", "7")];
        let result = reconcile(&records, &records).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.summary.unchanged, 2);
    }

    #[test]
    fn unchanged_match_keeps_snapshot_untouched() {
        let snapshot = vec![tree("G1", "ls", "10")];
        // Fresh id and geometry on the incoming side do not count as changes.
        let mut incoming = tree("G1", "ls", "10");
        incoming.geom = "SRID=4326;POINT(0 0)".into();
        let result = reconcile(&[incoming], &snapshot).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.summary.unchanged, 1);
    }

    #[test]
    fn equal_keys_of_other_sources_never_update() {
        let snapshot = vec![tree("G1", "sfm", "10")];
        let incoming = vec![tree("G1", "ls", "12")];
        let result = reconcile(&incoming, &snapshot).unwrap();
        assert!(result.updated.is_empty());
        assert_eq!(result.added.len(), 1);
        assert_eq!(result.deleted.len(), 1);
    }

    #[test]
    fn summary_reflects_lists() {
        let snapshot = vec![tree("A", "ls", "1"), tree("B", "ls", "2"), tree("C", "ls", "3")];
        let incoming = vec![tree("B", "ls", "2"), tree("C", "ls", "4"), tree("D", "ls", "5")];
        let result = reconcile(&incoming, &snapshot).unwrap();
        let s = &result.summary;
        assert_eq!((s.incoming, s.snapshot), (3, 3));
        assert_eq!((s.deleted, s.updated, s.added, s.unchanged), (1, 1, 1, 1));
        assert_eq!(s.field_counts["baumhoehe"], 1);
    }
}
