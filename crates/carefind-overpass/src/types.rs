//! Raw Overpass JSON response shapes.

use std::collections::BTreeMap;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<RawElement>,
    /// Set by the server when the query did not complete normally.
    #[serde(default)]
    pub remark: Option<String>,
}

/// One OSM node, way or relation. Ways and relations carry `center` instead
/// of `lat`/`lon` when queried with `out center`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawElement {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: i64,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub center: Option<RawCenter>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawCenter {
    pub lat: f64,
    pub lon: f64,
}

impl RawElement {
    /// Stable facility id, `osm:<type>/<id>`.
    #[must_use]
    pub fn facility_id(&self) -> String {
        format!("osm:{}/{}", self.kind, self.id)
    }

    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon, self.center) {
            (Some(lat), Some(lon), _) => Some((lat, lon)),
            (_, _, Some(center)) => Some((center.lat, center.lon)),
            _ => None,
        }
    }

    /// First non-blank value among `keys`, trimmed.
    #[must_use]
    pub fn tag(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|k| self.tags.get(*k))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
    }
}
