//! In-memory key-value store
//!
//! Uses DashMap for thread-safe concurrent access. State lives only as long as
//! the process; use [`FileStore`](crate::FileStore) when decisions must survive
//! a restart.

use crate::error::StoreResult;
use crate::traits::KeyValueStore;
use crate::value::StoredValue;
use dashmap::DashMap;
use tracing::{debug, trace};

/// In-memory key-value store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, StoredValue>,
}

impl MemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        debug!("Creating new in-memory gatekeeper store");
        Self {
            entries: DashMap::new(),
        }
    }

    /// Get the number of stored keys (for monitoring)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of every stored key, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<StoredValue>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: StoredValue) -> StoreResult<()> {
        trace!(key = %key, kind = value.kind(), "Setting value");
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        trace!(key = %key, "Removing value");
        self.entries.remove(key);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        Ok(self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect())
    }

    fn store_type(&self) -> &'static str {
        "memory"
    }

    fn remove_prefix(&self, prefix: &str) -> StoreResult<usize> {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before.saturating_sub(self.entries.len());
        debug!(prefix = %prefix, removed = removed, "Removed keys by prefix");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let store = MemoryStore::new();
        store.set("app.deviceId", StoredValue::from("ABC")).unwrap();

        assert_eq!(
            store.get_string("app.deviceId").unwrap(),
            Some("ABC".to_string())
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_missing_key_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("nope").unwrap(), None);
        assert!(!store.contains("nope").unwrap());
    }

    #[test]
    fn test_typed_getter_ignores_other_types() {
        let store = MemoryStore::new();
        store.set("flag", StoredValue::from("true")).unwrap();

        assert_eq!(store.get_bool("flag").unwrap(), None);
        assert_eq!(store.get_timestamp("flag").unwrap(), None);
    }

    #[test]
    fn test_remove() {
        let store = MemoryStore::new();
        store.set("key", StoredValue::from(true)).unwrap();
        store.remove("key").unwrap();
        store.remove("key").unwrap();

        assert!(store.is_empty());
    }

    #[test]
    fn test_prefix_scan_and_removal() {
        let store = MemoryStore::new();
        store.set("app.a", true.into()).unwrap();
        store.set("app.b", false.into()).unwrap();
        store.set("other.c", true.into()).unwrap();

        let mut keys = store.keys_with_prefix("app.").unwrap();
        keys.sort();
        assert_eq!(keys, vec!["app.a".to_string(), "app.b".to_string()]);

        assert_eq!(store.remove_prefix("app.").unwrap(), 2);
        assert_eq!(store.keys(), vec!["other.c".to_string()]);
    }

    #[test]
    fn test_store_type() {
        let store = MemoryStore::new();
        assert_eq!(store.store_type(), "memory");
    }
}
