//! JSON file key-value store
//!
//! Keeps every entry in memory and rewrites the backing file on each mutation.
//! Writes go to a temporary file in the same directory which is then renamed
//! over the target, so a crash never leaves a half-written file behind.

use crate::error::{StoreError, StoreResult};
use crate::traits::KeyValueStore;
use crate::value::StoredValue;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, trace};

/// File store configuration.
#[derive(Debug, Clone)]
pub struct FileStoreConfig {
    /// Path of the JSON file.
    pub path: PathBuf,
    /// Create parent directories if they don't exist.
    pub create_directories: bool,
}

impl FileStoreConfig {
    /// Create configuration for a file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            create_directories: true,
        }
    }

    /// Set whether missing parent directories are created on open.
    pub fn with_create_directories(mut self, create: bool) -> Self {
        self.create_directories = create;
        self
    }
}

/// JSON file backed key-value store.
pub struct FileStore {
    config: FileStoreConfig,
    entries: Mutex<BTreeMap<String, StoredValue>>,
}

impl FileStore {
    /// Open a store, loading any entries already persisted at the configured path.
    pub fn open(config: FileStoreConfig) -> StoreResult<Self> {
        let dir = parent_dir(&config.path);
        if config.create_directories {
            fs::create_dir_all(&dir)?;
        }

        let entries = load_entries(&config.path)?;
        info!(path = ?config.path, entries = entries.len(), "Opened file store");

        Ok(Self {
            config,
            entries: Mutex::new(entries),
        })
    }

    /// Open a store at `path` with default settings (convenience method).
    pub fn with_path(path: impl Into<PathBuf>) -> StoreResult<Self> {
        Self::open(FileStoreConfig::new(path))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn persist(&self, entries: &BTreeMap<String, StoredValue>) -> StoreResult<()> {
        let dir = parent_dir(&self.config.path);
        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, entries)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.config.path)
            .map_err(|e| StoreError::Io(e.error))?;

        trace!(path = ?self.config.path, entries = entries.len(), "Persisted file store");
        Ok(())
    }

    /// Apply `mutate` and persist; roll the in-memory map back if the write fails.
    fn mutate<F>(&self, mutate: F) -> StoreResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, StoredValue>) -> bool,
    {
        let mut entries = self.entries.lock();
        let snapshot = entries.clone();
        if !mutate(&mut entries) {
            return Ok(());
        }
        if let Err(err) = self.persist(&entries) {
            *entries = snapshot;
            return Err(err);
        }
        Ok(())
    }
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("path", &self.config.path)
            .field("entries", &self.len())
            .finish()
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<StoredValue>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: StoredValue) -> StoreResult<()> {
        trace!(key = %key, kind = value.kind(), "Setting value");
        self.mutate(|entries| {
            if entries.get(key) == Some(&value) {
                return false;
            }
            entries.insert(key.to_string(), value);
            true
        })
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        trace!(key = %key, "Removing value");
        self.mutate(|entries| entries.remove(key).is_some())
    }

    fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        Ok(self
            .entries
            .lock()
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn store_type(&self) -> &'static str {
        "file"
    }

    fn remove_prefix(&self, prefix: &str) -> StoreResult<usize> {
        let mut removed = 0;
        self.mutate(|entries| {
            let before = entries.len();
            entries.retain(|key, _| !key.starts_with(prefix));
            removed = before - entries.len();
            removed > 0
        })?;
        debug!(prefix = %prefix, removed = removed, "Removed keys by prefix");
        Ok(removed)
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn load_entries(path: &Path) -> StoreResult<BTreeMap<String, StoredValue>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(err) => return Err(err.into()),
    };

    if raw.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    serde_json::from_str(&raw)
        .map_err(|e| StoreError::corrupted(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::with_path(dir.path().join("state.json")).unwrap();

        assert!(store.is_empty());
        assert_eq!(store.store_type(), "file");
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let seen = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        {
            let store = FileStore::with_path(&path).unwrap();
            store.set("ns.deviceId", "DEVICE".into()).unwrap();
            store.set("ns.firstSeen.DEVICE", seen.into()).unwrap();
            store.set("ns.percentage.maps.DEVICE", false.into()).unwrap();
        }

        let store = FileStore::with_path(&path).unwrap();
        assert_eq!(
            store.get_string("ns.deviceId").unwrap(),
            Some("DEVICE".to_string())
        );
        assert_eq!(store.get_timestamp("ns.firstSeen.DEVICE").unwrap(), Some(seen));
        assert_eq!(store.get_bool("ns.percentage.maps.DEVICE").unwrap(), Some(false));
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("state.json");

        let store = FileStore::with_path(&path).unwrap();
        store.set("key", true.into()).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("state.json");
        let config = FileStoreConfig::new(&path).with_create_directories(false);

        let store = FileStore::open(config).unwrap();
        assert!(store.set("ns.deviceId", "DEVICE".into()).is_err());

        assert_eq!(store.get("ns.deviceId").unwrap(), None);
        assert!(store.is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn test_corrupted_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();

        let result = FileStore::with_path(&path);
        assert!(matches!(result, Err(StoreError::Corrupted(_))));
    }

    #[test]
    fn test_remove_prefix_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStore::with_path(&path).unwrap();
        store.set("ns.a", true.into()).unwrap();
        store.set("ns.b", true.into()).unwrap();
        store.set("keep", true.into()).unwrap();
        assert_eq!(store.remove_prefix("ns.").unwrap(), 2);

        let reopened = FileStore::with_path(&path).unwrap();
        assert_eq!(reopened.keys_with_prefix("").unwrap(), vec!["keep".to_string()]);
    }
}
