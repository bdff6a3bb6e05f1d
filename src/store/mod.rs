//! # Trail Store
//!
//! Durable collection of downloaded trail [`Area`]s.
//!
//! Each area is serialized to one JSON unit keyed by its sanitized name (see
//! [`sanitize_area_key`]). Two areas whose names sanitize to the same key
//! share a unit: saving the second overwrites the first.
//!
//! All operations are serialized behind a single lock over the backend.
//! Store I/O is blocking; keep it off latency-sensitive callback threads.
//!
//! ## Example
//!
//! ```rust
//! use trail_matcher::{Area, GeoPoint, MemoryBackend, Trail, TrailStore};
//!
//! let store = TrailStore::new(MemoryBackend::new());
//! let area = Area::new(
//!     "Aztec, NM",
//!     GeoPoint::new(36.88, -107.855),
//!     vec![Trail::new(1, "Road Apple", vec![GeoPoint::new(36.881, -107.856)])],
//! );
//!
//! store.save_area(&area).unwrap();
//! assert_eq!(store.load_areas().unwrap(), vec![area]);
//! assert_eq!(store.load_all_trails().unwrap().len(), 1);
//! ```

use std::io;
use std::sync::{Mutex, MutexGuard};

use log::{debug, error, info, warn};

use crate::{all_trails, Area, AreaSummary, GeoPoint, Trail};

mod backend;
mod format;

pub use backend::{DirectoryBackend, MemoryBackend, StorageBackend};

/// Errors from store operations.
///
/// Unreadable or malformed individual units are not errors; they are logged
/// and skipped while loading.
#[derive(Debug, thiserror::Error)]
#[cfg_attr(feature = "ffi", derive(uniffi::Error), uniffi(flat_error))]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("area serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("trail store lock poisoned")]
    Lock,

    #[error("area '{area}' has a non-finite coordinate")]
    NonFiniteCoordinate { area: String },
}

/// Configuration for the trail store and its directory layout.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory (under the app files directory) holding one file per area.
    /// Default: "trail_areas"
    pub area_dir_name: String,

    /// Legacy flat trail file, one level above the area directory.
    /// Default: "trails.json"
    pub legacy_file_name: String,

    /// Area name given to migrated legacy trails.
    /// Default: "Aztec NM"
    pub migration_area_name: String,

    /// Approximate center recorded for migrated legacy trails.
    /// Default: (36.88, -107.855)
    pub migration_center: GeoPoint,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            area_dir_name: "trail_areas".to_string(),
            legacy_file_name: "trails.json".to_string(),
            migration_area_name: "Aztec NM".to_string(),
            migration_center: GeoPoint::new(36.88, -107.855),
        }
    }
}

/// Map an area name to its persistence key.
///
/// Every character outside `[A-Za-z0-9_-]` becomes `_`.
///
/// ```
/// use trail_matcher::sanitize_area_key;
///
/// assert_eq!(sanitize_area_key("Aztec, NM"), "Aztec__NM");
/// assert_eq!(sanitize_area_key("36.88, -107.86"), "36_88__-107_86");
/// ```
pub fn sanitize_area_key(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Area store over a pluggable [`StorageBackend`].
pub struct TrailStore<B: StorageBackend> {
    backend: Mutex<B>,
    config: StoreConfig,
}

impl<B: StorageBackend> TrailStore<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, StoreConfig::default())
    }

    pub fn with_config(backend: B, config: StoreConfig) -> Self {
        Self {
            backend: Mutex::new(backend),
            config,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, B>, StoreError> {
        self.backend.lock().map_err(|_| StoreError::Lock)
    }

    /// Persist an area, replacing any unit with the same sanitized key.
    pub fn save_area(&self, area: &Area) -> Result<(), StoreError> {
        let mut backend = self.lock()?;
        Self::write_area(&mut *backend, area)
    }

    fn write_area(backend: &mut B, area: &Area) -> Result<(), StoreError> {
        // JSON has no NaN or infinity; such a unit would never load back
        let finite = |p: &GeoPoint| p.lat.is_finite() && p.lon.is_finite();
        if !finite(&area.center) || !area.trails.iter().flat_map(|t| &t.nodes).all(finite) {
            return Err(StoreError::NonFiniteCoordinate {
                area: area.name.clone(),
            });
        }

        let key = sanitize_area_key(&area.name);
        let data = format::encode_area(area)?;
        backend.write_unit(&key, &data)?;
        info!(
            "[TrailStore] Saved area '{}' with {} trails",
            area.name,
            area.trails.len()
        );
        Ok(())
    }

    /// Load every stored area.
    ///
    /// Units that cannot be read or parsed are logged and skipped. Only a
    /// failure to enumerate units is an error.
    pub fn load_areas(&self) -> Result<Vec<Area>, StoreError> {
        let raw: Vec<(String, io::Result<Vec<u8>>)> = {
            let backend = self.lock()?;
            backend
                .list_units()?
                .into_iter()
                .map(|key| {
                    let data = backend.read_unit(&key);
                    (key, data)
                })
                .collect()
        };

        #[cfg(feature = "parallel")]
        let areas: Vec<Area> = {
            use rayon::prelude::*;
            raw.into_par_iter()
                .filter_map(|(key, data)| decode_unit(&key, data))
                .collect()
        };

        #[cfg(not(feature = "parallel"))]
        let areas: Vec<Area> = raw
            .into_iter()
            .filter_map(|(key, data)| decode_unit(&key, data))
            .collect();

        debug!("[TrailStore] Loaded {} areas", areas.len());
        Ok(areas)
    }

    /// Every trail of every area, in area-then-trail order.
    pub fn load_all_trails(&self) -> Result<Vec<Trail>, StoreError> {
        Ok(all_trails(&self.load_areas()?))
    }

    /// Summaries of every stored area.
    pub fn summaries(&self) -> Result<Vec<AreaSummary>, StoreError> {
        Ok(self.load_areas()?.iter().map(Area::summary).collect())
    }

    /// Delete an area by name. Returns `Ok(false)` if nothing was stored.
    pub fn delete_area(&self, name: &str) -> Result<bool, StoreError> {
        let mut backend = self.lock()?;
        let removed = backend.remove_unit(&sanitize_area_key(name))?;
        if removed {
            info!("[TrailStore] Deleted area '{}'", name);
        }
        Ok(removed)
    }

    /// One-time migration of the legacy flat trail file into an area.
    ///
    /// When the legacy file holds at least one trail, the trails are saved
    /// as the configured migration area and the legacy file is removed.
    /// Any failure leaves the legacy file in place and returns no trails.
    pub fn migrate_old_trails(&self) -> Vec<Trail> {
        let mut backend = match self.lock() {
            Ok(backend) => backend,
            Err(e) => {
                error!("[TrailStore] Migration skipped: {}", e);
                return Vec::new();
            }
        };

        let data = match backend.read_legacy() {
            Ok(Some(data)) => data,
            Ok(None) => return Vec::new(),
            Err(e) => {
                error!("[TrailStore] Migration error reading legacy trails: {}", e);
                return Vec::new();
            }
        };

        if data.iter().all(u8::is_ascii_whitespace) {
            debug!("[TrailStore] Legacy trail file is empty, nothing to migrate");
            return Vec::new();
        }

        let trails = match format::decode_legacy(&data) {
            Ok(trails) => trails,
            Err(e) => {
                error!("[TrailStore] Migration error parsing legacy trails: {}", e);
                return Vec::new();
            }
        };

        if trails.is_empty() {
            return Vec::new();
        }

        let area = Area::new(
            self.config.migration_area_name.clone(),
            self.config.migration_center,
            trails,
        );
        if let Err(e) = Self::write_area(&mut *backend, &area) {
            error!("[TrailStore] Migration error saving area: {}", e);
            return Vec::new();
        }

        if let Err(e) = backend.remove_legacy() {
            warn!("[TrailStore] Migrated trails but could not remove legacy file: {}", e);
        }

        info!(
            "[TrailStore] Migrated {} old trails to '{}' area",
            area.trails.len(),
            area.name
        );
        area.trails
    }
}

fn decode_unit(key: &str, data: io::Result<Vec<u8>>) -> Option<Area> {
    let data = match data {
        Ok(data) => data,
        Err(e) => {
            error!("[TrailStore] Error reading unit {}: {}", key, e);
            return None;
        }
    };
    match format::decode_area(&data) {
        Ok(area) => Some(area),
        Err(e) => {
            error!("[TrailStore] Error loading unit {}: {}", key, e);
            None
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
