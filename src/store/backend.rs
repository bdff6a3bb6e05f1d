//! Persistence backends for the trail store.
//!
//! A backend stores opaque byte units under string keys, plus the single
//! legacy flat file that predates areas. The [`TrailStore`](super::TrailStore)
//! owns serialization and key sanitization; backends only move bytes.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use super::StoreConfig;

const UNIT_EXTENSION: &str = ".json";

/// Byte-level storage for area units.
///
/// Implementations need no internal locking: the store serializes every
/// call behind its own mutex.
pub trait StorageBackend: Send {
    /// Keys of every stored unit.
    fn list_units(&self) -> io::Result<Vec<String>>;

    /// Read a unit's bytes. Missing units are an `io::ErrorKind::NotFound` error.
    fn read_unit(&self, key: &str) -> io::Result<Vec<u8>>;

    /// Create or overwrite a unit.
    fn write_unit(&mut self, key: &str, data: &[u8]) -> io::Result<()>;

    /// Remove a unit. Returns `Ok(false)` if it did not exist.
    fn remove_unit(&mut self, key: &str) -> io::Result<bool>;

    /// Contents of the legacy flat trail file, if present.
    fn read_legacy(&self) -> io::Result<Option<Vec<u8>>>;

    /// Remove the legacy flat trail file. Absent is not an error.
    fn remove_legacy(&mut self) -> io::Result<()>;
}

// ============================================================================
// Directory Backend
// ============================================================================

/// One JSON file per area in a directory.
///
/// Layout under the app's files directory:
///
/// ```text
/// <base>/trails.json            legacy flat file
/// <base>/trail_areas/<key>.json one file per area
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryBackend {
    area_dir: PathBuf,
    legacy_path: PathBuf,
}

impl DirectoryBackend {
    /// Open the backend rooted at `base`, creating the area directory.
    pub fn open(base: impl AsRef<Path>, config: &StoreConfig) -> io::Result<Self> {
        let base = base.as_ref();
        let area_dir = base.join(&config.area_dir_name);
        fs::create_dir_all(&area_dir)?;

        Ok(Self {
            area_dir,
            legacy_path: base.join(&config.legacy_file_name),
        })
    }

    pub fn area_dir(&self) -> &Path {
        &self.area_dir
    }

    pub fn legacy_path(&self) -> &Path {
        &self.legacy_path
    }

    fn unit_path(&self, key: &str) -> PathBuf {
        self.area_dir.join(format!("{}{}", key, UNIT_EXTENSION))
    }
}

impl StorageBackend for DirectoryBackend {
    /// Keys are returned sorted so load order is stable across platforms.
    fn list_units(&self) -> io::Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.area_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            if let Some(key) = file_name
                .to_str()
                .and_then(|name| name.strip_suffix(UNIT_EXTENSION))
            {
                keys.push(key.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn read_unit(&self, key: &str) -> io::Result<Vec<u8>> {
        fs::read(self.unit_path(key))
    }

    /// Writes to a sibling temp file first, then renames over the unit.
    fn write_unit(&mut self, key: &str, data: &[u8]) -> io::Result<()> {
        let path = self.unit_path(key);
        let tmp = self.area_dir.join(format!("{}{}.tmp", key, UNIT_EXTENSION));
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &path)?;
        debug!("[DirectoryBackend] Wrote {} ({} bytes)", path.display(), data.len());
        Ok(())
    }

    fn remove_unit(&mut self, key: &str) -> io::Result<bool> {
        match fs::remove_file(self.unit_path(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn read_legacy(&self) -> io::Result<Option<Vec<u8>>> {
        match fs::read(&self.legacy_path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn remove_legacy(&mut self) -> io::Result<()> {
        match fs::remove_file(&self.legacy_path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

// ============================================================================
// Memory Backend
// ============================================================================

/// In-memory backend for tests and hosts without a writable filesystem.
///
/// Units enumerate in key order, matching [`DirectoryBackend`].
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    units: BTreeMap<String, Vec<u8>>,
    legacy: Option<Vec<u8>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the legacy flat file.
    pub fn with_legacy(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.legacy = Some(data.into());
        self
    }

    /// Insert raw unit bytes, bypassing serialization.
    pub fn insert_raw(&mut self, key: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.units.insert(key.into(), data.into());
    }

    pub fn has_legacy(&self) -> bool {
        self.legacy.is_some()
    }
}

impl StorageBackend for MemoryBackend {
    fn list_units(&self) -> io::Result<Vec<String>> {
        Ok(self.units.keys().cloned().collect())
    }

    fn read_unit(&self, key: &str) -> io::Result<Vec<u8>> {
        self.units
            .get(key)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no unit '{}'", key)))
    }

    fn write_unit(&mut self, key: &str, data: &[u8]) -> io::Result<()> {
        self.units.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn remove_unit(&mut self, key: &str) -> io::Result<bool> {
        Ok(self.units.remove(key).is_some())
    }

    fn read_legacy(&self) -> io::Result<Option<Vec<u8>>> {
        Ok(self.legacy.clone())
    }

    fn remove_legacy(&mut self) -> io::Result<()> {
        self.legacy = None;
        Ok(())
    }
}
