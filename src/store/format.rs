//! On-disk JSON shape of area units and the legacy trail file.
//!
//! ```json
//! {
//!   "name": "Aztec NM",
//!   "centerLat": 36.88,
//!   "centerLon": -107.855,
//!   "downloadedAt": 1700000000000,
//!   "trails": [
//!     {
//!       "id": 1,
//!       "name": "Road Apple",
//!       "difficulty": "",
//!       "nodes": [{ "lat": 36.88, "lon": -107.855 }]
//!     }
//!   ]
//! }
//! ```
//!
//! The legacy file is a bare array of the trail records above. An empty
//! `difficulty` string means the trail has no difficulty tag.

use serde::{Deserialize, Serialize};

use crate::{normalize_difficulty, Area, GeoPoint, Trail};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AreaRecord {
    name: String,
    center_lat: f64,
    center_lon: f64,
    #[serde(default)]
    downloaded_at: i64,
    trails: Vec<TrailRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TrailRecord {
    id: i64,
    name: String,
    #[serde(default)]
    difficulty: String,
    nodes: Vec<GeoPoint>,
}

impl From<&Trail> for TrailRecord {
    fn from(trail: &Trail) -> Self {
        Self {
            id: trail.id,
            name: trail.name.clone(),
            difficulty: trail.difficulty.clone().unwrap_or_default(),
            nodes: trail.nodes.clone(),
        }
    }
}

impl From<TrailRecord> for Trail {
    fn from(record: TrailRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            nodes: record.nodes,
            difficulty: normalize_difficulty(Some(record.difficulty)),
        }
    }
}

pub(crate) fn encode_area(area: &Area) -> serde_json::Result<Vec<u8>> {
    let record = AreaRecord {
        name: area.name.clone(),
        center_lat: area.center.lat,
        center_lon: area.center.lon,
        downloaded_at: area.downloaded_at,
        trails: area.trails.iter().map(TrailRecord::from).collect(),
    };
    serde_json::to_vec(&record)
}

pub(crate) fn decode_area(data: &[u8]) -> serde_json::Result<Area> {
    let record: AreaRecord = serde_json::from_slice(data)?;
    Ok(Area {
        name: record.name,
        center: GeoPoint::new(record.center_lat, record.center_lon),
        trails: record.trails.into_iter().map(Trail::from).collect(),
        downloaded_at: record.downloaded_at,
    })
}

pub(crate) fn decode_legacy(data: &[u8]) -> serde_json::Result<Vec<Trail>> {
    let records: Vec<TrailRecord> = serde_json::from_slice(data)?;
    Ok(records.into_iter().map(Trail::from).collect())
}
