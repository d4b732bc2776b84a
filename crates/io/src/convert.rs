//! Loader output → stored record layout.

use std::f64::consts::PI;

use serde::Serialize;
use tracing::warn;
use treesync_core::geo::point_ewkt;
use treesync_core::{CanonicalTreeRecord, CoordinateOrder, TreeRecord};

use crate::genera;

/// A record whose genus has no entry in the genus table. The record is still
/// converted, with no German genus name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationWarning {
    pub reference: String,
    pub genus: Option<String>,
}

impl std::fmt::Display for ClassificationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "no genus description for '{}' (tree {})",
            self.genus.as_deref().unwrap_or(""),
            self.reference
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct Conversion {
    pub records: Vec<CanonicalTreeRecord>,
    pub warnings: Vec<ClassificationWarning>,
}

/// Binds loaded trees to a source tag and its coordinate convention.
#[derive(Debug, Clone)]
pub struct Converter {
    pub source: String,
    pub coordinate_order: CoordinateOrder,
}

impl Converter {
    pub fn new(source: impl Into<String>, coordinate_order: CoordinateOrder) -> Self {
        Self {
            source: source.into(),
            coordinate_order,
        }
    }

    pub fn convert(&self, trees: Vec<TreeRecord>) -> Conversion {
        let mut out = Conversion {
            records: Vec::with_capacity(trees.len()),
            warnings: Vec::new(),
        };
        for tree in trees {
            let (record, warning) = self.convert_one(tree);
            if let Some(w) = warning {
                warn!(tree = %w.reference, genus = ?w.genus, "no genus description found");
                out.warnings.push(w);
            }
            out.records.push(record);
        }
        out
    }

    fn convert_one(&self, tree: TreeRecord) -> (CanonicalTreeRecord, Option<ClassificationWarning>) {
        let genus_entry = tree.genus.as_deref().and_then(genera::lookup);
        let warning = genus_entry.is_none().then(|| ClassificationWarning {
            reference: tree.reference.clone(),
            genus: tree.genus.clone(),
        });

        let (lat, lng) = self.coordinate_order.apply(&tree.lat, &tree.lon);
        let (lat, lng) = (lat.to_string(), lng.to_string());
        let geom = point_ewkt(&lat, &lng);

        let record = CanonicalTreeRecord {
            id: tree.internal_ref,
            natural_key: tree.reference,
            source: self.source.clone(),
            lat,
            lng,
            common_name: tree.common,
            scientific_name: tree.species,
            genus_common: genus_entry.map(|g| g.display_name.to_string()),
            genus: tree.genus,
            street: tree.address,
            crown_diameter: tree.crown.map(format_measure),
            trunk_girth: tree.dbh.map(|dbh| format!("{}", (dbh * PI).round() as i64)),
            height: tree.height.map(format_measure),
            planting_year: tree.planted,
            geom,
        };
        (record, warning)
    }
}

/// Shortest decimal text: `12.0` → `"12"`, `10.5` → `"10.5"`.
pub fn format_measure(value: f64) -> String {
    format!("{value}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture;

    fn sample() -> TreeRecord {
        TreeRecord {
            internal_ref: "abc".into(),
            reference: "G123".into(),
            location: Some("Öffentliches Grün".into()),
            address: Some("Breiter Weg".into()),
            lat: "52.1205".into(),
            lon: "11.6276".into(),
            genus: Some("Tilia".into()),
            species: Some("Tilia cordata".into()),
            common: Some("Winter-Linde".into()),
            height: Some(12.0),
            crown: Some(10.5),
            dbh: Some(20.0),
            planted: Some(1990),
        }
    }

    #[test]
    fn maps_every_column() {
        let conv = Converter::new("ls", CoordinateOrder::LatLng).convert(vec![sample()]);
        assert!(conv.warnings.is_empty());
        let r = &conv.records[0];
        assert_eq!(r.id.as_str(), "abc");
        assert_eq!(r.natural_key, "G123");
        assert_eq!(r.source, "ls");
        assert_eq!(r.lat, "52.1205");
        assert_eq!(r.lng, "11.6276");
        assert_eq!(r.common_name.as_deref(), Some("Winter-Linde"));
        assert_eq!(r.scientific_name.as_deref(), Some("Tilia cordata"));
        assert_eq!(r.genus_common.as_deref(), Some("Linde"));
        assert_eq!(r.genus.as_deref(), Some("Tilia"));
        assert_eq!(r.street.as_deref(), Some("Breiter Weg"));
        assert_eq!(r.crown_diameter.as_deref(), Some("10.5"));
        assert_eq!(r.trunk_girth.as_deref(), Some("63"));
        assert_eq!(r.height.as_deref(), Some("12"));
        assert_eq!(r.planting_year, Some(1990));
        assert_eq!(r.geom, "SRID=4326;POINT(11.6276 52.1205)");
    }

    #[test]
    fn swapped_sources_transpose_coordinates() {
        let conv = Converter::new("sfm", CoordinateOrder::Swapped).convert(vec![sample()]);
        let r = &conv.records[0];
        assert_eq!(r.lat, "11.6276");
        assert_eq!(r.lng, "52.1205");
        assert_eq!(r.geom, "SRID=4326;POINT(52.1205 11.6276)");
    }

    #[test]
    fn missing_measurements_stay_null() {
        let mut tree = sample();
        tree.height = None;
        tree.crown = None;
        tree.dbh = None;
        let r = &Converter::new("ls", CoordinateOrder::LatLng).convert(vec![tree]).records[0];
        assert_eq!(r.height, None);
        assert_eq!(r.crown_diameter, None);
        assert_eq!(r.trunk_girth, None);
    }

    #[test]
    fn unknown_genus_warns_but_converts() {
        let mut tree = sample();
        tree.genus = Some("Welwitschia".into());
        let conv = Converter::new("ls", CoordinateOrder::LatLng).convert(vec![tree]);
        assert_eq!(conv.records.len(), 1);
        assert_eq!(conv.records[0].genus_common, None);
        assert_eq!(conv.warnings.len(), 1);
        assert_eq!(
            conv.warnings[0].to_string(),
            "no genus description for 'Welwitschia' (tree G123)"
        );
    }

    #[test]
    fn fixture_converts_cleanly() {
        let conv = Converter::new("test", CoordinateOrder::LatLng).convert(fixture::load());
        assert_eq!(conv.records.len(), 3);
        assert!(conv.warnings.is_empty());
        assert!(conv.records.iter().all(|r| r.trunk_girth.as_deref() == Some("31")));
        assert!(conv.records.iter().all(|r| r.genus_common.as_deref() == Some("Mehlbeere")));
    }
}
