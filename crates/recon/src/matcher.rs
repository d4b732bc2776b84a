use std::collections::{HashMap, HashSet};

use treesync_core::{CanonicalTreeRecord, RecordKey};

use crate::error::ReconError;
use crate::model::{MatchedPair, PairMatchOutput, Side};

/// Match incoming records against the snapshot by exact `(natural_key, source)`.
///
/// The snapshot side is indexed once; each incoming record is looked up in
/// it. Records with the same natural key but different sources never match.
/// A key occurring twice on the same side is rejected.
pub fn match_by_key<'a>(
    incoming: &'a [CanonicalTreeRecord],
    snapshot: &'a [CanonicalTreeRecord],
) -> Result<PairMatchOutput<'a>, ReconError> {
    let mut snapshot_map: HashMap<RecordKey, &CanonicalTreeRecord> =
        HashMap::with_capacity(snapshot.len());
    for record in snapshot {
        if snapshot_map.insert(record.key(), record).is_some() {
            return Err(ReconError::DuplicateKey {
                side: Side::Snapshot,
                key: record.key(),
            });
        }
    }

    let mut seen: HashSet<RecordKey> = HashSet::with_capacity(incoming.len());
    let mut matched = Vec::new();
    let mut incoming_only = Vec::new();

    for record in incoming {
        let key = record.key();
        if let Some(stored) = snapshot_map.get(&key) {
            matched.push(MatchedPair {
                incoming: record,
                snapshot: stored,
            });
        } else {
            incoming_only.push(record);
        }
        if !seen.insert(key) {
            return Err(ReconError::DuplicateKey {
                side: Side::Incoming,
                key: record.key(),
            });
        }
    }

    let snapshot_only = snapshot
        .iter()
        .filter(|r| !seen.contains(&r.key()))
        .collect();

    Ok(PairMatchOutput {
        matched,
        incoming_only,
        snapshot_only,
    })
}
