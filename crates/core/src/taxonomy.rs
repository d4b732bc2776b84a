use serde::Serialize;

/// Botanical breakdown of a free-text genus/species description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TreeClassification {
    pub fullname: Option<String>,
    pub genus: Option<String>,
    pub species: Option<String>,
    pub variety: Option<String>,
    pub scientific: Option<String>,
    pub common: Option<String>,
}
