//! # File I/O Module
//!
//! A [`KeyValueStore`] backed by a single JSON document on disk, with:
//! - **Atomic saves**: write to `.tmp`, fsync, rename over the original
//! - **File locking**: `.lock` files so two planners don't clobber each other
//! - **Version validation**: refuse documents from an incompatible schema
//!
//! ## File Format
//!
//! Workbooks are saved as `.linen` files:
//!
//! ```json
//! {
//!   "version": "0.1.0",
//!   "saved_at": "2026-03-01T09:30:00Z",
//!   "slots": { "linen-par-level": 1.5, "linen-margin": 40, "...": "..." }
//! }
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use linen_core::file_io::{JsonFileStore, StoreLock};
//! use linen_core::workbook::Workbook;
//! use std::path::Path;
//!
//! let path = Path::new("portfolio.linen");
//! let lock = StoreLock::acquire(path, "ops@example.com")?;
//!
//! let mut store = JsonFileStore::open(path)?;
//! let mut workbook = Workbook::load_from(&store);
//! workbook.set_par_level(3);
//! workbook.save_to(&mut store)?;
//! store.flush()?;
//!
//! drop(lock);
//! # Ok::<(), linen_core::errors::LinenError>(())
//! ```

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::errors::{LinenError, LinenResult};
use crate::storage::KeyValueStore;
use crate::workbook::{Workbook, SCHEMA_VERSION};

/// File extension for workbook documents
pub const FILE_EXTENSION: &str = "linen";

/// On-disk document holding every slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreDocument {
    /// Schema version (for migration compatibility)
    pub version: String,
    /// When the document was last written
    pub saved_at: DateTime<Utc>,
    /// Slot name → JSON value
    #[serde(default)]
    pub slots: BTreeMap<String, Value>,
}

impl StoreDocument {
    fn empty() -> Self {
        StoreDocument {
            version: SCHEMA_VERSION.to_string(),
            saved_at: Utc::now(),
            slots: BTreeMap::new(),
        }
    }
}

/// Key-value store persisted as one JSON file.
///
/// Writes go to memory; [`flush`](Self::flush) commits them atomically.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    document: StoreDocument,
    dirty: bool,
}

impl JsonFileStore {
    /// Open a store, reading the file if it exists.
    ///
    /// # Returns
    ///
    /// * `Ok(JsonFileStore)` - Loaded (or empty, if the file does not exist yet)
    /// * `Err(LinenError::VersionMismatch)` - File version is incompatible
    /// * `Err(LinenError::SerializationError)` - Invalid JSON
    /// * `Err(LinenError::FileError)` - I/O error
    pub fn open(path: &Path) -> LinenResult<Self> {
        let document = if path.exists() {
            read_document(path)?
        } else {
            debug!(path = %path.display(), "no existing store, starting empty");
            StoreDocument::empty()
        };

        Ok(JsonFileStore {
            path: path.to_path_buf(),
            document,
            dirty: false,
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True if there are writes not yet flushed
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// When the backing file was last written
    pub fn saved_at(&self) -> DateTime<Utc> {
        self.document.saved_at
    }

    /// Write all slots to disk atomically.
    ///
    /// The save process:
    /// 1. Serialize the document to JSON
    /// 2. Write to a temporary file (`.tmp`)
    /// 3. Sync to disk (fsync)
    /// 4. Rename `.tmp` over the target (atomic on most filesystems)
    pub fn flush(&mut self) -> LinenResult<()> {
        self.document.version = SCHEMA_VERSION.to_string();
        self.document.saved_at = Utc::now();
        write_atomic(&self.path, &self.document)?;
        self.dirty = false;
        info!(path = %self.path.display(), slots = self.document.slots.len(), "saved store");
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn load_value(&self, key: &str) -> Option<Value> {
        self.document.slots.get(key).cloned()
    }

    fn save_value(&mut self, key: &str, value: Value) -> LinenResult<()> {
        self.document.slots.insert(key.to_string(), value);
        self.dirty = true;
        Ok(())
    }
}

/// Save a workbook to a `.linen` file in one step.
pub fn save_workbook(workbook: &Workbook, path: &Path) -> LinenResult<()> {
    let mut store = JsonFileStore::open(path)?;
    workbook.save_to(&mut store)?;
    store.flush()
}

/// Load a workbook from a `.linen` file; a missing file yields the defaults.
pub fn load_workbook(path: &Path) -> LinenResult<Workbook> {
    let store = JsonFileStore::open(path)?;
    Ok(Workbook::load_from(&store))
}

fn read_document(path: &Path) -> LinenResult<StoreDocument> {
    let mut file = File::open(path).map_err(|e| {
        LinenError::file_error("open", path.display().to_string(), e.to_string())
    })?;

    let mut contents = String::new();
    file.read_to_string(&mut contents).map_err(|e| {
        LinenError::file_error("read", path.display().to_string(), e.to_string())
    })?;

    let document: StoreDocument =
        serde_json::from_str(&contents).map_err(|e| LinenError::SerializationError {
            reason: format!("Invalid JSON in {}: {}", path.display(), e),
        })?;

    validate_version(&document.version)?;
    Ok(document)
}

fn write_atomic(path: &Path, document: &StoreDocument) -> LinenResult<()> {
    let json = serde_json::to_string_pretty(document)?;

    let tmp_path = tmp_path_for(path);

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        LinenError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(json.as_bytes()).map_err(|e| {
        LinenError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        LinenError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        LinenError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    Ok(())
}

/// `portfolio.linen` → `portfolio.linen.<suffix>`
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut sibling = path.to_path_buf();
    let extension = sibling
        .extension()
        .map(|e| format!("{}.{}", e.to_string_lossy(), suffix))
        .unwrap_or_else(|| suffix.to_string());
    sibling.set_extension(extension);
    sibling
}

fn tmp_path_for(path: &Path) -> PathBuf {
    sibling_path(path, "tmp")
}

fn lock_path_for(path: &Path) -> PathBuf {
    sibling_path(path, "lock")
}

/// Major must match; within 0.x a newer minor is rejected.
fn validate_version(file_version: &str) -> LinenResult<()> {
    let mismatch = || LinenError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let file_parts: Vec<u32> = file_version
        .split('.')
        .filter_map(|p| p.parse().ok())
        .collect();
    let current_parts: Vec<u32> = SCHEMA_VERSION
        .split('.')
        .filter_map(|p| p.parse().ok())
        .collect();

    let (Some(file_major), Some(current_major)) = (file_parts.first(), current_parts.first()) else {
        return Err(mismatch());
    };
    if file_major != current_major {
        return Err(mismatch());
    }

    if *current_major == 0 {
        if let (Some(file_minor), Some(current_minor)) = (file_parts.get(1), current_parts.get(1)) {
            if file_minor > current_minor {
                return Err(mismatch());
            }
        }
    }

    Ok(())
}

// ============================================================================
// Locking
// ============================================================================

/// Lock file metadata stored in `.linen.lock` files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// User identifier (email or username)
    pub user_id: String,
    /// Machine name where lock was acquired
    pub machine: String,
    /// Process ID that holds the lock
    pub pid: u32,
    /// When the lock was acquired
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    /// Create new lock info for the current process
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }
}

fn hostname() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("COMPUTERNAME").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOSTNAME")
            .ok()
            .or_else(|| std::env::var("HOST").ok())
    }
}

/// Exclusive lock on a store file, released on drop.
///
/// Combines an OS-level lock (fs2) with a `.lock` file describing the holder
/// so other users can see who has the workbook open.
#[derive(Debug)]
pub struct StoreLock {
    store_path: PathBuf,
    lock_path: PathBuf,
    _lock_file: File,
    pub info: LockInfo,
}

impl StoreLock {
    /// Acquire the lock, taking over stale ones.
    ///
    /// # Returns
    ///
    /// * `Ok(StoreLock)` - Lock acquired
    /// * `Err(LinenError::FileLocked)` - Another live process holds it
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> LinenResult<Self> {
        let lock_path = lock_path_for(path);
        let info = LockInfo::new(user_id);

        if let Some(existing) = StoreLock::check(path) {
            return Err(LinenError::file_locked(
                path.display().to_string(),
                format!("{} ({})", existing.user_id, existing.machine),
                existing.locked_at.to_rfc3339(),
            ));
        }

        let mut lock_file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(|e| {
                LinenError::file_error("create lock", lock_path.display().to_string(), e.to_string())
            })?;

        lock_file.try_lock_exclusive().map_err(|_| {
            LinenError::file_locked(path.display().to_string(), "another process", "unknown")
        })?;

        let lock_json = serde_json::to_string_pretty(&info)?;
        lock_file.write_all(lock_json.as_bytes()).map_err(|e| {
            LinenError::file_error("write lock", lock_path.display().to_string(), e.to_string())
        })?;
        lock_file.sync_all().map_err(|e| {
            LinenError::file_error("sync lock", lock_path.display().to_string(), e.to_string())
        })?;

        debug!(path = %path.display(), user = %info.user_id, "acquired store lock");
        Ok(StoreLock {
            store_path: path.to_path_buf(),
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    /// Who holds a live lock on `path`, if anyone.
    pub fn check(path: &Path) -> Option<LockInfo> {
        let lock_path = lock_path_for(path);
        if !lock_path.exists() {
            return None;
        }
        match read_lock_info(&lock_path) {
            Ok(info) if !is_lock_stale(&info) => Some(info),
            Ok(info) => {
                warn!(path = %path.display(), holder = %info.user_id, "taking over stale lock");
                None
            }
            Err(_) => None,
        }
    }

    /// Path of the locked store
    pub fn store_path(&self) -> &Path {
        &self.store_path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

fn read_lock_info(lock_path: &Path) -> LinenResult<LockInfo> {
    let contents = fs::read_to_string(lock_path).map_err(|e| {
        LinenError::file_error("read lock", lock_path.display().to_string(), e.to_string())
    })?;
    Ok(serde_json::from_str(&contents)?)
}

/// A lock is stale if its process is gone (same machine) or it is over a day old.
fn is_lock_stale(info: &LockInfo) -> bool {
    if hostname().as_deref() == Some(info.machine.as_str()) && !process_alive(info.pid) {
        return true;
    }
    (Utc::now() - info.locked_at).num_hours() > 24
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    Path::new(&format!("/proc/{}", pid)).exists()
}

#[cfg(windows)]
fn process_alive(pid: u32) -> bool {
    use std::process::Command;
    Command::new("tasklist")
        .args(["/FI", &format!("PID eq {}", pid), "/NH"])
        .output()
        .map(|o| String::from_utf8_lossy(&o.stdout).contains(&pid.to_string()))
        .unwrap_or(true)
}

#[cfg(not(any(unix, windows)))]
fn process_alive(_pid: u32) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::slots;
    use tempfile::TempDir;

    fn store_path(dir: &TempDir, name: &str) -> PathBuf {
        dir.path().join(format!("{}.{}", name, FILE_EXTENSION))
    }

    #[test]
    fn test_sibling_paths() {
        let path = Path::new("/data/portfolio.linen");
        assert_eq!(lock_path_for(path), Path::new("/data/portfolio.linen.lock"));
        assert_eq!(tmp_path_for(path), Path::new("/data/portfolio.linen.tmp"));
        assert_eq!(lock_path_for(Path::new("plain")), Path::new("plain.lock"));
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(&store_path(&dir, "missing")).unwrap();
        assert!(store.load_value(slots::PROPERTIES).is_none());
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_workbook_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir, "roundtrip");

        let mut workbook = Workbook::new();
        workbook.set_par_level(2);
        workbook.set_unit_price("Bath Towels", 6.5);
        workbook.scenario_name = "Peak season".to_string();
        save_workbook(&workbook, &path).unwrap();

        let loaded = load_workbook(&path).unwrap();
        assert_eq!(loaded, workbook);
    }

    #[test]
    fn test_atomic_save_leaves_no_tmp_file() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir, "atomic");

        let mut store = JsonFileStore::open(&path).unwrap();
        store.save(slots::MARGIN, &25.0).unwrap();
        assert!(store.is_dirty());
        store.flush().unwrap();

        assert!(!store.is_dirty());
        assert!(path.exists());
        assert!(!tmp_path_for(&path).exists());
    }

    #[test]
    fn test_corrupt_file_is_serialization_error() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir, "corrupt");
        fs::write(&path, "{ not json").unwrap();

        let err = JsonFileStore::open(&path).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_incompatible_version_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir, "future");
        fs::write(&path, r#"{ "version": "1.0.0", "saved_at": "2026-01-01T00:00:00Z", "slots": {} }"#).unwrap();

        let err = JsonFileStore::open(&path).unwrap_err();
        assert!(matches!(err, LinenError::VersionMismatch { .. }));
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.0").is_ok());
        assert!(validate_version("0.1.9").is_ok());
        assert!(validate_version("0.0.3").is_ok());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("garbage").is_err());
    }

    #[test]
    fn test_lock_acquire_and_release() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir, "locked");

        let lock = StoreLock::acquire(&path, "ops@example.com").unwrap();
        assert_eq!(lock.info.user_id, "ops@example.com");
        assert_eq!(lock.store_path(), path.as_path());
        assert!(lock_path_for(&path).exists());

        drop(lock);
        assert!(!lock_path_for(&path).exists());
        assert!(StoreLock::check(&path).is_none());
    }

    #[test]
    fn test_old_lock_is_stale() {
        let info = LockInfo {
            user_id: "someone".to_string(),
            machine: "elsewhere-host".to_string(),
            pid: 1,
            locked_at: Utc::now() - chrono::Duration::hours(30),
        };
        assert!(is_lock_stale(&info));

        let fresh = LockInfo {
            locked_at: Utc::now(),
            ..info
        };
        assert!(!is_lock_stale(&fresh));
    }
}
