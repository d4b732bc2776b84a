#![allow(dead_code)]

use treesync_core::{CanonicalTreeRecord, TreeId};
use treesync_recon::{SnapshotStore, StoreError};

/// In-memory tree table with adoption rows that behave like a foreign key:
/// deleting a tree that is still referenced fails.
#[derive(Default)]
pub struct MemoryStore {
    pub trees: Vec<CanonicalTreeRecord>,
    pub adopted: Vec<TreeId>,
    pub watered: Vec<TreeId>,
    pub log: Vec<String>,
}

impl MemoryStore {
    pub fn with_trees(trees: Vec<CanonicalTreeRecord>) -> Self {
        Self { trees, ..Default::default() }
    }
}

impl SnapshotStore for MemoryStore {
    fn read_snapshot(&mut self, source: &str) -> Result<Vec<CanonicalTreeRecord>, StoreError> {
        self.log.push(format!("read:{source}"));
        Ok(self.trees.iter().filter(|t| t.source == source).cloned().collect())
    }

    fn delete_dependents(&mut self, ids: &[TreeId]) -> Result<(), StoreError> {
        self.log.push(format!("delete_dependents:{}", ids.len()));
        self.adopted.retain(|id| !ids.contains(id));
        self.watered.retain(|id| !ids.contains(id));
        Ok(())
    }

    fn delete(&mut self, ids: &[TreeId]) -> Result<(), StoreError> {
        self.log.push(format!("delete:{}", ids.len()));
        if let Some(id) = ids.iter().find(|id| self.adopted.contains(id) || self.watered.contains(id)) {
            return Err(StoreError::Message(format!("tree {id} still referenced")));
        }
        self.trees.retain(|t| !ids.contains(&t.id));
        Ok(())
    }

    fn update(&mut self, records: &[CanonicalTreeRecord]) -> Result<(), StoreError> {
        self.log.push(format!("update:{}", records.len()));
        for record in records {
            if let Some(stored) = self
                .trees
                .iter_mut()
                .find(|t| t.natural_key == record.natural_key && t.source == record.source)
            {
                let id = stored.id.clone();
                *stored = record.clone();
                stored.id = id;
            }
        }
        Ok(())
    }

    fn insert(&mut self, records: &[CanonicalTreeRecord]) -> Result<(), StoreError> {
        self.log.push(format!("insert:{}", records.len()));
        self.trees.extend_from_slice(records);
        Ok(())
    }
}

pub fn tree(key: &str, source: &str) -> CanonicalTreeRecord {
    CanonicalTreeRecord {
        id: TreeId::generate(),
        natural_key: key.into(),
        source: source.into(),
        lat: "52.123".into(),
        lng: "11.123".into(),
        common_name: Some("Eberesche (Vogelbeere)".into()),
        scientific_name: Some("Sorbus aucuparia".into()),
        genus_common: Some("Mehlbeeren".into()),
        genus: Some("Sorbus".into()),
        street: Some("Teststraße".into()),
        crown_diameter: Some("10".into()),
        trunk_girth: Some("31".into()),
        height: Some("10".into()),
        planting_year: Some(2020),
        geom: "SRID=4326;POINT(11.123 52.123)".into(),
    }
}

pub fn with_height(mut record: CanonicalTreeRecord, height: &str) -> CanonicalTreeRecord {
    record.height = Some(height.into());
    record
}
