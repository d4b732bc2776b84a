use serde::{Deserialize, Serialize};

/// How a source's coordinates map onto the stored `lat`/`lng` columns.
///
/// Some providers ship latitude and longitude transposed. Each source opts
/// in to the swap explicitly; nothing inherits it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateOrder {
    #[default]
    LatLng,
    Swapped,
}

impl CoordinateOrder {
    /// Returns the `(lat, lng)` to store for a loaded `(lat, lon)` pair.
    pub fn apply<'a>(&self, lat: &'a str, lon: &'a str) -> (&'a str, &'a str) {
        match self {
            Self::LatLng => (lat, lon),
            Self::Swapped => (lon, lat),
        }
    }
}

/// EWKT point in WGS 84, longitude first.
pub fn point_ewkt(lat: &str, lng: &str) -> String {
    format!("SRID=4326;POINT({lng} {lat})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ewkt_puts_longitude_first() {
        assert_eq!(point_ewkt("52.1", "11.6"), "SRID=4326;POINT(11.6 52.1)");
    }

    #[test]
    fn swapped_order_transposes() {
        assert_eq!(CoordinateOrder::LatLng.apply("52", "11"), ("52", "11"));
        assert_eq!(CoordinateOrder::Swapped.apply("52", "11"), ("11", "52"));
    }
}
