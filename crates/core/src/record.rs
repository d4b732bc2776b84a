use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Storage primary key of a tree row.
///
/// Generated once when a loader produces a record. Only records that end up
/// inserted keep their id; existing rows keep the id they were stored with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeId(String);

impl TreeId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TreeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TreeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a tree across runs: natural key scoped by source.
/// Never matches across sources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RecordKey {
    pub natural_key: String,
    pub source: String,
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.natural_key, self.source)
    }
}

// ---------------------------------------------------------------------------
// Loader output
// ---------------------------------------------------------------------------

/// A tree as produced by a loader: normalized and classified, not yet bound
/// to a source or to the stored column layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeRecord {
    pub internal_ref: TreeId,
    /// External reference of the provider (becomes `gmlid`).
    pub reference: String,
    pub location: Option<String>,
    pub address: Option<String>,
    /// Latitude as text, original precision.
    pub lat: String,
    /// Longitude as text, original precision.
    pub lon: String,
    pub genus: Option<String>,
    /// Full scientific name.
    pub species: Option<String>,
    pub common: Option<String>,
    pub height: Option<f64>,
    pub crown: Option<f64>,
    /// Trunk diameter.
    pub dbh: Option<f64>,
    pub planted: Option<i32>,
}

// ---------------------------------------------------------------------------
// Stored shape
// ---------------------------------------------------------------------------

/// The reconciled entity, in the column layout of the `trees` table.
///
/// Serialized names match the stored column names; measurements stay text
/// because existing rows store them that way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalTreeRecord {
    pub id: TreeId,
    #[serde(rename = "gmlid")]
    pub natural_key: String,
    pub source: String,
    pub lat: String,
    pub lng: String,
    #[serde(rename = "artdtsch")]
    pub common_name: Option<String>,
    #[serde(rename = "artbot")]
    pub scientific_name: Option<String>,
    #[serde(rename = "gattungdeutsch")]
    pub genus_common: Option<String>,
    #[serde(rename = "gattung")]
    pub genus: Option<String>,
    #[serde(rename = "strname")]
    pub street: Option<String>,
    #[serde(rename = "kronedurch")]
    pub crown_diameter: Option<String>,
    #[serde(rename = "stammumfg")]
    pub trunk_girth: Option<String>,
    #[serde(rename = "baumhoehe")]
    pub height: Option<String>,
    #[serde(rename = "pflanzjahr")]
    pub planting_year: Option<i32>,
    /// Derived from `lat`/`lng`; never compared.
    pub geom: String,
}

impl CanonicalTreeRecord {
    pub fn key(&self) -> RecordKey {
        RecordKey {
            natural_key: self.natural_key.clone(),
            source: self.source.clone(),
        }
    }
}

/// Comparable columns of a [`CanonicalTreeRecord`].
///
/// `geom` is deliberately absent: it is derived from `lat`/`lng`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeField {
    Lat,
    Lng,
    CommonName,
    ScientificName,
    GenusCommon,
    Genus,
    Street,
    CrownDiameter,
    TrunkGirth,
    Height,
    PlantingYear,
}

impl TreeField {
    pub const COMPARABLE: [TreeField; 11] = [
        TreeField::Lat,
        TreeField::Lng,
        TreeField::CommonName,
        TreeField::ScientificName,
        TreeField::GenusCommon,
        TreeField::Genus,
        TreeField::Street,
        TreeField::CrownDiameter,
        TreeField::TrunkGirth,
        TreeField::Height,
        TreeField::PlantingYear,
    ];

    /// Column name in the `trees` table.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Lat => "lat",
            Self::Lng => "lng",
            Self::CommonName => "artdtsch",
            Self::ScientificName => "artbot",
            Self::GenusCommon => "gattungdeutsch",
            Self::Genus => "gattung",
            Self::Street => "strname",
            Self::CrownDiameter => "kronedurch",
            Self::TrunkGirth => "stammumfg",
            Self::Height => "baumhoehe",
            Self::PlantingYear => "pflanzjahr",
        }
    }
}

impl fmt::Display for TreeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}
