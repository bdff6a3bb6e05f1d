//! # Overpass
//!
//! Query building and response parsing for the OpenStreetMap Overpass API.
//!
//! Trails are OSM ways: named paths, tracks and cycleways, plus any way with
//! an `mtb:scale` tag. The response lists nodes and ways as flat `elements`;
//! each way references its nodes by id.
//!
//! Networking lives in the `http` module; everything here is pure.

use std::collections::{HashMap, HashSet};

use log::debug;
use serde::Deserialize;

use crate::{GeoPoint, Trail};

/// Name given to ways that carry a difficulty tag but no name.
pub const UNNAMED_TRAIL: &str = "Unnamed Trail";

/// Miles per degree of latitude, as used for download extents.
const MILES_PER_DEGREE: f64 = 69.0;

/// Axis-aligned query extent in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Box of roughly `radius_miles` around `center`.
    ///
    /// Uses a flat 69 miles per degree, widened in longitude by the cosine of
    /// the center latitude.
    ///
    /// ```
    /// use trail_matcher::{BoundingBox, GeoPoint};
    ///
    /// let bbox = BoundingBox::around(GeoPoint::new(0.0, 10.0), 69.0);
    /// assert!((bbox.min_lat + 1.0).abs() < 1e-9);
    /// assert!((bbox.max_lon - 11.0).abs() < 1e-9);
    /// ```
    pub fn around(center: GeoPoint, radius_miles: f64) -> Self {
        let lat_offset = radius_miles / MILES_PER_DEGREE;
        let lon_offset = radius_miles / (MILES_PER_DEGREE * center.lat.to_radians().cos());

        Self {
            min_lat: center.lat - lat_offset,
            min_lon: center.lon - lon_offset,
            max_lat: center.lat + lat_offset,
            max_lon: center.lon + lon_offset,
        }
    }

    /// Overpass `(south,west,north,east)` filter.
    fn filter(&self) -> String {
        format!(
            "({},{},{},{})",
            self.min_lat, self.min_lon, self.max_lat, self.max_lon
        )
    }
}

/// Overpass QL query for every trail way inside `bbox`.
pub fn build_query(bbox: &BoundingBox) -> String {
    let b = bbox.filter();
    format!(
        "[out:json][timeout:60];\n\
         (\n  \
         way[\"highway\"=\"path\"][\"name\"]{b};\n  \
         way[\"highway\"=\"track\"][\"name\"]{b};\n  \
         way[\"highway\"=\"cycleway\"][\"name\"]{b};\n  \
         way[\"mtb:scale\"]{b};\n\
         );\n\
         out body;\n\
         >;\n\
         out skel qt;"
    )
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<Element>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Element {
    Node {
        id: i64,
        lat: f64,
        lon: f64,
    },
    Way {
        id: i64,
        #[serde(default)]
        nodes: Vec<i64>,
        #[serde(default)]
        tags: HashMap<String, String>,
    },
    #[serde(other)]
    Other,
}

/// Parse an Overpass JSON response into trails.
///
/// Ways without a name are kept only when they carry an `mtb:scale` tag, as
/// [`UNNAMED_TRAIL`]. Node references missing from the response are
/// skipped, and ways left with no nodes are dropped. Repeated way ids keep
/// the first occurrence. Output follows response order.
///
/// ```
/// let json = r#"{"elements": [
///     {"type": "node", "id": 1, "lat": 36.88, "lon": -107.855},
///     {"type": "way", "id": 10, "nodes": [1], "tags": {"name": "Road Apple"}}
/// ]}"#;
/// let trails = trail_matcher::parse_trails(json).unwrap();
/// assert_eq!(trails[0].name, "Road Apple");
/// ```
pub fn parse_trails(json: &str) -> serde_json::Result<Vec<Trail>> {
    let response: OverpassResponse = serde_json::from_str(json)?;

    let node_map: HashMap<i64, GeoPoint> = response
        .elements
        .iter()
        .filter_map(|e| match e {
            Element::Node { id, lat, lon } => Some((*id, GeoPoint::new(*lat, *lon))),
            _ => None,
        })
        .collect();

    let mut seen = HashSet::new();
    let mut trails = Vec::new();

    for element in response.elements {
        let Element::Way { id, nodes, mut tags } = element else {
            continue;
        };

        let name = tags.remove("name").filter(|n| !n.is_empty());
        let difficulty = tags.remove("mtb:scale").filter(|d| !d.is_empty());
        if name.is_none() && difficulty.is_none() {
            continue;
        }

        let points: Vec<GeoPoint> = nodes
            .iter()
            .filter_map(|n| node_map.get(n).copied())
            .collect();
        if points.is_empty() || !seen.insert(id) {
            continue;
        }

        trails.push(Trail {
            id,
            name: name.unwrap_or_else(|| UNNAMED_TRAIL.to_string()),
            nodes: points,
            difficulty,
        });
    }

    debug!(
        "[Overpass] Parsed {} trails from {} nodes",
        trails.len(),
        node_map.len()
    );
    Ok(trails)
}

/// Display name for a downloaded area from reverse-geocoding parts.
///
/// The city is the locality, else the sub-admin area (county), else the
/// admin area. Gives `"{city}, {admin_area}"` when both are known and differ,
/// otherwise whichever is known, otherwise the center formatted to two
/// decimals. Blank parts count as unknown.
///
/// ```
/// use trail_matcher::{area_label, GeoPoint};
///
/// let center = GeoPoint::new(36.8812, -107.8551);
/// assert_eq!(area_label(Some("Aztec"), None, Some("NM"), &center), "Aztec, NM");
/// assert_eq!(area_label(None, None, None, &center), "36.88, -107.86");
/// ```
pub fn area_label(
    locality: Option<&str>,
    sub_admin_area: Option<&str>,
    admin_area: Option<&str>,
    center: &GeoPoint,
) -> String {
    fn known(part: Option<&str>) -> Option<&str> {
        part.map(str::trim).filter(|p| !p.is_empty())
    }

    let state = known(admin_area);
    let city = known(locality).or(known(sub_admin_area)).or(state);

    match (city, state) {
        (Some(city), Some(state)) if city != state => format!("{}, {}", city, state),
        (Some(city), _) => city.to_string(),
        (None, _) => format!("{:.2}, {:.2}", center.lat, center.lon),
    }
}
