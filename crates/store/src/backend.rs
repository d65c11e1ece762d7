//! Persistence backends.
//!
//! A backend is dumb storage: it moves the whole attribute map (and the
//! legacy blob, until migration consumes it) in and out of a durable
//! location. Validation and merge policy live in [`AttributeStore`].
//!
//! [`AttributeStore`]: crate::AttributeStore

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{io_error, StoreError};
use crate::value::AttributeMap;

const ATTRIBUTES_FILE: &str = "attributes.json";
const LEGACY_FILE: &str = "legacy_profile.json";

/// Raw persistence for the profile map and the legacy-format blob.
///
/// Implementations must be `Send + Sync`; the store serializes
/// read-modify-write cycles above this trait.
pub trait ProfileBackend: Send + Sync {
    /// Returns the persisted map, or `None` if nothing was ever stored.
    fn load_attributes(&self) -> Result<Option<AttributeMap>, StoreError>;

    /// Overwrites the persisted map as a whole.
    fn persist_attributes(&self, map: &AttributeMap) -> Result<(), StoreError>;

    /// Removes the persisted map entirely. Absent is not an error.
    fn erase_attributes(&self) -> Result<(), StoreError>;

    /// Returns the legacy-format JSON blob, if one is still present.
    fn legacy_blob(&self) -> Result<Option<String>, StoreError>;

    /// Removes the legacy blob. Absent is not an error.
    fn erase_legacy_blob(&self) -> Result<(), StoreError>;
}

/// Filesystem-backed persistence rooted at a data directory.
///
/// The current map lives in `attributes.json`; a not-yet-migrated
/// legacy profile lives in `legacy_profile.json`.
#[derive(Debug, Clone)]
pub struct FsBackend {
    dir: PathBuf,
}

impl FsBackend {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| io_error(&dir, e))?;
        Ok(Self { dir })
    }

    fn attributes_path(&self) -> PathBuf {
        self.dir.join(ATTRIBUTES_FILE)
    }

    fn legacy_path(&self) -> PathBuf {
        self.dir.join(LEGACY_FILE)
    }

    // Write to a sibling temp file, then rename over the target, so a
    // crash mid-write never leaves a truncated attributes file behind.
    fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        let tmp = path.with_extension("json.tmp");
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp)
            .map_err(|e| io_error(&tmp, e))?;
        file.write_all(bytes).map_err(|e| io_error(&tmp, e))?;
        file.sync_all().map_err(|e| io_error(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| io_error(path, e))?;
        Ok(())
    }

    fn remove_if_present(path: &Path) -> Result<(), StoreError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error(path, err)),
        }
    }
}

impl ProfileBackend for FsBackend {
    fn load_attributes(&self) -> Result<Option<AttributeMap>, StoreError> {
        let path = self.attributes_path();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_error(&path, err)),
        };
        let map = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Backend(format!("{}: {}", path.display(), e)))?;
        Ok(Some(map))
    }

    fn persist_attributes(&self, map: &AttributeMap) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(map)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Self::write_atomic(&self.attributes_path(), &bytes)
    }

    fn erase_attributes(&self) -> Result<(), StoreError> {
        Self::remove_if_present(&self.attributes_path())
    }

    fn legacy_blob(&self) -> Result<Option<String>, StoreError> {
        let path = self.legacy_path();
        match fs::read_to_string(&path) {
            Ok(blob) => Ok(Some(blob)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(&path, err)),
        }
    }

    fn erase_legacy_blob(&self) -> Result<(), StoreError> {
        Self::remove_if_present(&self.legacy_path())
    }
}

/// In-memory persistence for tests and mock-driven suites. Cloning
/// shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<RwLock<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    attributes: Option<AttributeMap>,
    legacy: Option<String>,
}

impl MemoryBackend {
    /// Seeds the persisted map, as if a previous run had stored it.
    pub fn set_attributes(&self, map: AttributeMap) {
        self.inner.write().unwrap_or_else(PoisonError::into_inner).attributes = Some(map);
    }

    /// Seeds the legacy blob, as if a legacy install were present.
    pub fn set_legacy_blob(&self, blob: impl Into<String>) {
        self.inner.write().unwrap_or_else(PoisonError::into_inner).legacy = Some(blob.into());
    }

    /// The persisted map as stored, bypassing the store's load default.
    pub fn stored_attributes(&self) -> Option<AttributeMap> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).attributes.clone()
    }

    pub fn stored_legacy_blob(&self) -> Option<String> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).legacy.clone()
    }
}

impl ProfileBackend for MemoryBackend {
    fn load_attributes(&self) -> Result<Option<AttributeMap>, StoreError> {
        Ok(self.inner.read().unwrap_or_else(PoisonError::into_inner).attributes.clone())
    }

    fn persist_attributes(&self, map: &AttributeMap) -> Result<(), StoreError> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner).attributes = Some(map.clone());
        Ok(())
    }

    fn erase_attributes(&self) -> Result<(), StoreError> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner).attributes = None;
        Ok(())
    }

    fn legacy_blob(&self) -> Result<Option<String>, StoreError> {
        Ok(self.inner.read().unwrap_or_else(PoisonError::into_inner).legacy.clone())
    }

    fn erase_legacy_blob(&self) -> Result<(), StoreError> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner).legacy = None;
        Ok(())
    }
}
