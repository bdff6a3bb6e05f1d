//! # Trail Matcher
//!
//! On-device trail matching for GPS tracking: which named trail a moving
//! rider is on, approaching or leaving.
//!
//! This library provides:
//! - Nearest-node trail matching with a three-zone proximity state machine
//! - Bearing, compass and relative-direction cues toward the nearest trail
//! - An arrival edge detector for audible alerts
//! - A durable per-area trail store with legacy flat-file migration
//! - Overpass API response parsing (and optional download)
//!
//! ## Features
//!
//! - **`parallel`** - Parse stored areas in parallel with rayon
//! - **`http`** - Enable the Overpass HTTP client
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use trail_matcher::{
//!     evaluate, format_status, GeoPoint, LocationSample, MatchConfig, MatcherState, Trail,
//!     TrailStatus,
//! };
//!
//! let trails = vec![Trail::new(
//!     1,
//!     "Road Apple",
//!     vec![GeoPoint::new(36.8800, -107.8550), GeoPoint::new(36.8810, -107.8550)],
//! )];
//!
//! let state = MatcherState::default();
//! let sample = LocationSample::new(GeoPoint::new(36.8801, -107.8551), None);
//!
//! let (matched, _state) = evaluate(&state, &sample, &trails, &MatchConfig::default());
//! assert_eq!(matched.status, TrailStatus::OnTrail);
//! assert_eq!(format_status(&matched), "On: Road Apple");
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

pub mod geo_utils;
pub use geo_utils::{Compass, RelativeDirection};

// Trail matching state machine
pub mod matcher;
pub use matcher::{evaluate, Match, MatchConfig, MatcherState, TrailStatus};

// Human-readable status text
pub mod format;
pub use format::{format_status, NO_TRAILS_STATUS, NO_TRAIL_STATUS};

// Per-observer tracking state and arrival alerts
pub mod tracker;
pub use tracker::{ArrivalConfig, ArrivalDetector, Tracker, TrackerUpdate};

// Background evaluation loop fed by location samples
pub mod session;
pub use session::{SessionConfig, TrackingSession};

// Area persistence
pub mod store;
pub use store::{
    sanitize_area_key, DirectoryBackend, MemoryBackend, StorageBackend, StoreConfig, StoreError,
    TrailStore,
};

// Overpass query building and response parsing
pub mod overpass;
pub use overpass::{area_label, build_query, parse_trails, BoundingBox};

// HTTP module for trail downloads
#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{OverpassClient, OverpassConfig};

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("TrailMatcherRust"),
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// A geographic coordinate in degrees.
///
/// Serializes as `{"lat": .., "lon": ..}`, the node shape of the stored
/// area format.
///
/// # Example
/// ```
/// use trail_matcher::GeoPoint;
/// let point = GeoPoint::new(36.88, -107.855); // Aztec, NM
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Create a new point.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Check if the point has valid coordinates.
    ///
    /// Matching never requires this; it is offered for callers that want to
    /// filter provider output.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// A named trail: an ordered polyline of nodes.
///
/// Identity is `id`; `name` is for display and need not be unique. A trail
/// without nodes is legal but never matches anything.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Trail {
    pub id: i64,
    pub name: String,
    pub nodes: Vec<GeoPoint>,
    /// Difficulty tag (e.g. `mtb:scale`). Never `Some("")`.
    pub difficulty: Option<String>,
}

impl Trail {
    /// Create a trail without a difficulty tag.
    pub fn new(id: i64, name: impl Into<String>, nodes: Vec<GeoPoint>) -> Self {
        Self {
            id,
            name: name.into(),
            nodes,
            difficulty: None,
        }
    }

    /// Attach a difficulty tag. Empty tags are treated as absent.
    pub fn with_difficulty(mut self, difficulty: impl Into<String>) -> Self {
        self.difficulty = normalize_difficulty(Some(difficulty.into()));
        self
    }

    /// Length of the trail polyline in meters.
    pub fn length_meters(&self) -> f64 {
        geo_utils::polyline_length(&self.nodes)
    }
}

/// Collapse empty difficulty strings to `None`.
pub(crate) fn normalize_difficulty(difficulty: Option<String>) -> Option<String> {
    difficulty.filter(|d| !d.is_empty())
}

/// A named, geographically-centered collection of trails downloaded together.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Area {
    /// Display name, also the persistence key once sanitized
    pub name: String,
    /// Center of the download query
    pub center: GeoPoint,
    pub trails: Vec<Trail>,
    /// Download time (Unix epoch milliseconds)
    pub downloaded_at: i64,
}

impl Area {
    /// Create an area stamped with the current time.
    pub fn new(name: impl Into<String>, center: GeoPoint, trails: Vec<Trail>) -> Self {
        Self {
            name: name.into(),
            center,
            trails,
            downloaded_at: now_millis(),
        }
    }

    /// Listing summary for this area.
    pub fn summary(&self) -> AreaSummary {
        AreaSummary {
            name: self.name.clone(),
            trail_count: self.trails.len() as u32,
            total_length_meters: self.trails.iter().map(Trail::length_meters).sum(),
            preview_names: self
                .trails
                .iter()
                .take(AreaSummary::PREVIEW_LEN)
                .map(|t| t.name.clone())
                .collect(),
        }
    }
}

/// Lightweight description of a stored area for listings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct AreaSummary {
    pub name: String,
    pub trail_count: u32,
    /// Sum of all trail polyline lengths
    pub total_length_meters: f64,
    /// Names of the first few trails, in stored order
    pub preview_names: Vec<String>,
}

impl AreaSummary {
    /// Number of trail names carried in `preview_names`.
    pub const PREVIEW_LEN: usize = 5;
}

/// Flatten areas into their trails, in area-then-trail order.
pub fn all_trails(areas: &[Area]) -> Vec<Trail> {
    areas.iter().flat_map(|a| a.trails.iter().cloned()).collect()
}

/// One position fix from the location provider.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct LocationSample {
    pub position: GeoPoint,
    /// Heading of travel in degrees. `None` or 0 means unknown.
    pub heading: Option<f32>,
}

impl LocationSample {
    pub fn new(position: GeoPoint, heading: Option<f32>) -> Self {
        Self { position, heading }
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

// ============================================================================
// FFI Exports (only when feature enabled)
// ============================================================================

#[cfg(feature = "ffi")]
mod ffi {
    use super::*;
    use log::info;
    use std::sync::{Arc, Mutex};

    /// Result of one matcher step: the match and the state to pass next time.
    #[derive(Debug, Clone, uniffi::Record)]
    pub struct FfiEvaluation {
        pub matched: Match,
        pub state: MatcherState,
    }

    /// Evaluate one location sample against a trail set.
    #[uniffi::export]
    pub fn ffi_evaluate(
        state: MatcherState,
        sample: LocationSample,
        trails: Vec<Trail>,
    ) -> FfiEvaluation {
        let (matched, state) = evaluate(&state, &sample, &trails, &MatchConfig::default());
        FfiEvaluation { matched, state }
    }

    /// Format a match as status text.
    #[uniffi::export]
    pub fn ffi_format_status(matched: Match) -> String {
        format_status(&matched)
    }

    /// Compose an area display name from reverse-geocoding parts.
    #[uniffi::export]
    pub fn ffi_area_label(
        locality: Option<String>,
        sub_admin_area: Option<String>,
        admin_area: Option<String>,
        center: GeoPoint,
    ) -> String {
        area_label(
            locality.as_deref(),
            sub_admin_area.as_deref(),
            admin_area.as_deref(),
            &center,
        )
    }

    /// Parse an Overpass JSON response into trails (empty on malformed input).
    #[uniffi::export]
    pub fn ffi_parse_overpass(response: String) -> Vec<Trail> {
        init_logging();
        parse_trails(&response).unwrap_or_else(|e| {
            log::warn!("[TrailMatcherRust] Overpass parse failed: {}", e);
            Vec::new()
        })
    }

    /// Download trails around a point (blocking). Empty on any failure.
    #[cfg(feature = "http")]
    #[uniffi::export]
    pub fn ffi_download_trails_nearby(center: GeoPoint, radius_miles: f64) -> Vec<Trail> {
        init_logging();
        http::download_trails_nearby_sync(center, radius_miles)
    }

    /// Directory-backed trail store handle.
    #[derive(uniffi::Object)]
    pub struct FfiTrailStore {
        inner: TrailStore<DirectoryBackend>,
    }

    #[uniffi::export]
    impl FfiTrailStore {
        /// Open (creating if needed) the store under an app files directory.
        #[uniffi::constructor]
        pub fn new(files_dir: String) -> Result<Arc<Self>, StoreError> {
            init_logging();
            info!("[TrailMatcherRust] Opening trail store in {}", files_dir);
            let backend = DirectoryBackend::open(files_dir, &StoreConfig::default())?;
            Ok(Arc::new(Self {
                inner: TrailStore::new(backend),
            }))
        }

        pub fn save_area(&self, area: Area) -> Result<(), StoreError> {
            self.inner.save_area(&area)
        }

        pub fn load_areas(&self) -> Result<Vec<Area>, StoreError> {
            self.inner.load_areas()
        }

        pub fn load_all_trails(&self) -> Result<Vec<Trail>, StoreError> {
            self.inner.load_all_trails()
        }

        pub fn delete_area(&self, name: String) -> Result<bool, StoreError> {
            self.inner.delete_area(&name)
        }

        pub fn migrate_old_trails(&self) -> Vec<Trail> {
            self.inner.migrate_old_trails()
        }

        pub fn summaries(&self) -> Result<Vec<AreaSummary>, StoreError> {
            self.inner.summaries()
        }
    }

    /// Tracker handle for hosts that deliver location callbacks.
    ///
    /// Calls are serialized through an internal lock so samples are applied
    /// in call order.
    #[derive(uniffi::Object)]
    pub struct FfiTrailTracker {
        trails: Vec<Trail>,
        tracker: Mutex<Tracker>,
    }

    #[uniffi::export]
    impl FfiTrailTracker {
        #[uniffi::constructor]
        pub fn new(trails: Vec<Trail>) -> Arc<Self> {
            init_logging();
            info!("[TrailMatcherRust] Tracker started with {} trails", trails.len());
            Arc::new(Self {
                trails,
                tracker: Mutex::new(Tracker::new()),
            })
        }

        /// Apply a sample; returns true on an arrival edge.
        pub fn on_location(&self, sample: LocationSample) -> bool {
            match self.tracker.lock() {
                Ok(mut tracker) => tracker.on_sample(&sample, &self.trails).arrived,
                Err(_) => false,
            }
        }

        /// Latest status text.
        pub fn status(&self) -> String {
            self.tracker
                .lock()
                .map(|t| t.status().to_string())
                .unwrap_or_else(|_| NO_TRAIL_STATUS.to_string())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
