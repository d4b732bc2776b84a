//! Fixed three-tree dataset for smoke runs.

use treesync_core::{TreeId, TreeRecord};

use crate::classify::classify;

const GENUS_TEXT: &str = "Sorbus aucuparia, Eberesche (Vogelbeere)";

pub fn load() -> Vec<TreeRecord> {
    [("1", "52.123", "11.123"), ("2", "52.124", "11.124"), ("3", "52.122", "11.122")]
        .into_iter()
        .map(|(reference, lat, lon)| {
            let class = classify(Some(GENUS_TEXT));
            TreeRecord {
                internal_ref: TreeId::generate(),
                reference: reference.to_string(),
                location: Some("Testgebiet".to_string()),
                address: Some("Teststraße".to_string()),
                lat: lat.to_string(),
                lon: lon.to_string(),
                genus: class.genus,
                species: class.scientific,
                common: class.common,
                height: Some(10.0),
                crown: Some(10.0),
                dbh: Some(10.0),
                planted: Some(2020),
            }
        })
        .collect()
}
