//! Distance check between OpenStreetMap tree nodes and stored trees.
//!
//! Used to spot OSM-mapped trees that are probably already in the register.

use std::path::Path;

use serde::{Deserialize, Serialize};
use treesync_core::CanonicalTreeRecord;

use crate::csv::read_file_as_utf8;
use crate::error::LoadError;

/// Mean earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Source tag of trees imported from OSM; excluded from the comparison set.
pub const OSM_SOURCE: &str = "osm";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OsmNode {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
struct OsmExport {
    elements: Vec<OsmNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCandidate {
    pub node_id: i64,
    pub lat: f64,
    pub lon: f64,
    /// `None` when there is no stored tree to compare with.
    pub meters_to_nearest_tree: Option<f64>,
}

/// Parse an Overpass JSON export (`{"elements": [{"id", "lat", "lon"}, ...]}`).
pub fn parse_osm_nodes(json: &str) -> Result<Vec<OsmNode>, LoadError> {
    let export: OsmExport = serde_json::from_str(json)?;
    Ok(export.elements)
}

pub fn read_osm_nodes(path: &Path) -> Result<Vec<OsmNode>, LoadError> {
    parse_osm_nodes(&read_file_as_utf8(path)?)
}

/// Great-circle distance in meters.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();
    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// For each node, the distance to the nearest tree not tagged [`OSM_SOURCE`].
/// Trees with unparseable coordinates are ignored.
pub fn check_locations(nodes: &[OsmNode], trees: &[CanonicalTreeRecord]) -> Vec<LocationCandidate> {
    let points: Vec<(f64, f64)> = trees
        .iter()
        .filter(|t| t.source != OSM_SOURCE)
        .filter_map(|t| Some((t.lat.parse::<f64>().ok()?, t.lng.parse::<f64>().ok()?)))
        .collect();

    nodes
        .iter()
        .map(|node| LocationCandidate {
            node_id: node.id,
            lat: node.lat,
            lon: node.lon,
            meters_to_nearest_tree: points
                .iter()
                .map(|(lat, lng)| haversine_m(node.lat, node.lon, *lat, *lng))
                .min_by(f64::total_cmp),
        })
        .collect()
}
