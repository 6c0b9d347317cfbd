//! Key-value store trait definition.

use crate::error::StoreResult;
use crate::value::StoredValue;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Trait for key-value persistence backends.
///
/// Implementations must be safe to share between threads. Every operation is
/// synchronous and expected to complete in bounded local time.
pub trait KeyValueStore: Send + Sync {
    /// Get the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key has never been written or was removed.
    fn get(&self, key: &str) -> StoreResult<Option<StoredValue>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: StoredValue) -> StoreResult<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StoreResult<()>;

    /// List every key starting with `prefix`.
    fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>>;

    /// Get store type name for debugging
    fn store_type(&self) -> &'static str;

    /// Get a string value. Values of another type read as absent.
    fn get_string(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.get(key)?.and_then(|v| match v {
            StoredValue::String(s) => Some(s),
            _ => None,
        }))
    }

    /// Get a boolean value. Values of another type read as absent.
    fn get_bool(&self, key: &str) -> StoreResult<Option<bool>> {
        Ok(self.get(key)?.and_then(|v| v.as_bool()))
    }

    /// Get a timestamp value. Values of another type read as absent.
    fn get_timestamp(&self, key: &str) -> StoreResult<Option<DateTime<Utc>>> {
        Ok(self.get(key)?.and_then(|v| v.as_timestamp()))
    }

    /// Check if a key exists.
    fn contains(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Remove every key starting with `prefix`, returning how many were removed.
    fn remove_prefix(&self, prefix: &str) -> StoreResult<usize> {
        let keys = self.keys_with_prefix(prefix)?;
        for key in &keys {
            self.remove(key)?;
        }
        Ok(keys.len())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> StoreResult<Option<StoredValue>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: StoredValue) -> StoreResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        (**self).remove(key)
    }

    fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        (**self).keys_with_prefix(prefix)
    }

    fn store_type(&self) -> &'static str {
        (**self).store_type()
    }

    fn remove_prefix(&self, prefix: &str) -> StoreResult<usize> {
        (**self).remove_prefix(prefix)
    }
}
