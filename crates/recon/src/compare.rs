use treesync_core::{CanonicalTreeRecord, TreeField};

/// Comparable fields whose values differ between `stored` and `incoming`.
///
/// Strict value comparison: no trimming, no numeric tolerance, so `"10"` and
/// `"10.0"` differ. `geom`, `id` and the key fields are not compared.
pub fn changed_fields(stored: &CanonicalTreeRecord, incoming: &CanonicalTreeRecord) -> Vec<TreeField> {
    TreeField::COMPARABLE
        .into_iter()
        .filter(|field| field_differs(*field, stored, incoming))
        .collect()
}

/// True when any comparable field differs.
pub fn has_changes(stored: &CanonicalTreeRecord, incoming: &CanonicalTreeRecord) -> bool {
    TreeField::COMPARABLE
        .into_iter()
        .any(|field| field_differs(field, stored, incoming))
}

fn field_differs(field: TreeField, a: &CanonicalTreeRecord, b: &CanonicalTreeRecord) -> bool {
    match field {
        TreeField::Lat => a.lat != b.lat,
        TreeField::Lng => a.lng != b.lng,
        TreeField::CommonName => a.common_name != b.common_name,
        TreeField::ScientificName => a.scientific_name != b.scientific_name,
        TreeField::GenusCommon => a.genus_common != b.genus_common,
        TreeField::Genus => a.genus != b.genus,
        TreeField::Street => a.street != b.street,
        TreeField::CrownDiameter => a.crown_diameter != b.crown_diameter,
        TreeField::TrunkGirth => a.trunk_girth != b.trunk_girth,
        TreeField::Height => a.height != b.height,
        TreeField::PlantingYear => a.planting_year != b.planting_year,
    }
}
