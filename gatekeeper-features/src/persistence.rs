//! Decision persistence
//!
//! Durable per-(feature, device) gating state: the first-seen timestamp that
//! anchors expiration and the frozen outcome of the percentage rollout draw.
//!
//! Store failures are never surfaced from here. A failed read is treated as
//! absent and a failed write is dropped, both traced at `warn` level.

use crate::identity::DeviceIdentity;
use crate::keys::KeySpace;
use crate::random::RandomSource;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use gatekeeper_store::{KeyValueStore, StoreResult, StoredValue};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Reads and writes gating state for devices.
pub struct DecisionStore {
    store: Arc<dyn KeyValueStore>,
    keys: KeySpace,
    random: Arc<dyn RandomSource>,
    /// One lock per state key, covering each read-or-write sequence.
    key_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl DecisionStore {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        keys: KeySpace,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            store,
            keys,
            random,
            key_locks: DashMap::new(),
        }
    }

    pub fn keys(&self) -> &KeySpace {
        &self.keys
    }

    /// When expiration tracking started for `device`, if it has.
    pub fn first_seen(&self, device: &DeviceIdentity) -> Option<DateTime<Utc>> {
        let key = self.keys.first_seen(device.as_str());
        absent_on_error(&key, self.store.get_timestamp(&key))
    }

    /// Record when expiration tracking started. Overwrites any previous value.
    pub fn set_first_seen(&self, device: &DeviceIdentity, at: DateTime<Utc>) {
        let key = self.keys.first_seen(device.as_str());
        trace!(key = %key, at = %at, "Recording first-seen time");
        ignore_on_error(&key, self.store.set(&key, StoredValue::timestamp(at)));
    }

    /// The first-seen time for `device`, recording `now` if there is none.
    ///
    /// Returns `None` when `now` was recorded by this call. The check and the
    /// write run under the per-key lock, so concurrent first observations
    /// record the time once.
    pub fn first_seen_or_record(
        &self,
        device: &DeviceIdentity,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let key = self.keys.first_seen(device.as_str());
        let lock = self.key_lock(&key);
        let _guard = lock.lock();

        if let Some(first_seen) = absent_on_error(&key, self.store.get_timestamp(&key)) {
            return Some(first_seen);
        }

        debug!(device_id = %device, at = %now, "Recording first observation");
        ignore_on_error(&key, self.store.set(&key, StoredValue::timestamp(now)));
        None
    }

    /// The stored bucket assignment, without drawing one.
    pub fn bucket_assignment(&self, feature: &str, device: &DeviceIdentity) -> Option<bool> {
        let key = self.keys.percentage(feature, device.as_str());
        absent_on_error(&key, self.store.get_bool(&key))
    }

    /// Resolve the bucket assignment, drawing it on first use.
    ///
    /// An existing assignment is returned unchanged and `percentage` is ignored.
    /// Otherwise `r` is drawn from `[0, 100)` and the device is included when
    /// `r < percentage`. The check and the draw run under a lock held per
    /// (feature, device), so concurrent first evaluations observe one outcome.
    pub fn assign_bucket(&self, feature: &str, device: &DeviceIdentity, percentage: f64) -> bool {
        let key = self.keys.percentage(feature, device.as_str());
        let lock = self.key_lock(&key);
        let _guard = lock.lock();

        if let Some(included) = absent_on_error(&key, self.store.get_bool(&key)) {
            trace!(key = %key, included = included, "Bucket already assigned");
            return included;
        }

        let roll = self.random.roll_percent();
        let included = roll < percentage;
        ignore_on_error(&key, self.store.set(&key, StoredValue::boolean(included)));

        debug!(
            feature = %feature,
            device_id = %device,
            percentage = percentage,
            roll = roll,
            included = included,
            "Assigned rollout bucket"
        );
        included
    }

    /// Remove the first-seen time and every bucket assignment for `device`.
    pub fn reset_device(&self, device: &DeviceIdentity) {
        let first_seen = self.keys.first_seen(device.as_str());
        ignore_on_error(&first_seen, self.store.remove(&first_seen));

        let prefix = self.keys.percentage_prefix();
        let keys = match self.store.keys_with_prefix(&prefix) {
            Ok(keys) => keys,
            Err(err) => {
                warn!(prefix = %prefix, error = %err, "Failed to list bucket assignments");
                Vec::new()
            }
        };

        let mut removed = 0;
        for key in keys
            .iter()
            .filter(|key| self.keys.is_percentage_key_for(key, device.as_str()))
        {
            ignore_on_error(key, self.store.remove(key));
            removed += 1;
        }

        debug!(device_id = %device, buckets = removed, "Reset device decision state");
    }

    /// Remove everything under the namespace, including the device identity.
    pub fn wipe_all(&self) {
        let prefix = self.keys.root_prefix();
        match self.store.remove_prefix(&prefix) {
            Ok(removed) => debug!(namespace = %self.keys.namespace(), removed = removed, "Wiped gatekeeper state"),
            Err(err) => warn!(prefix = %prefix, error = %err, "Failed to wipe gatekeeper state"),
        }
    }

    /// Locks stay in the map for the life of the store; callers racing a wipe
    /// still share one lock per key.
    fn key_lock(&self, key: &str) -> Arc<Mutex<()>> {
        self.key_locks.entry(key.to_string()).or_default().clone()
    }
}

impl fmt::Debug for DecisionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecisionStore")
            .field("keys", &self.keys)
            .field("store", &self.store.store_type())
            .finish()
    }
}

fn absent_on_error<T>(key: &str, result: StoreResult<Option<T>>) -> Option<T> {
    result.unwrap_or_else(|err| {
        warn!(key = %key, error = %err, "Store read failed; treating as absent");
        None
    })
}

fn ignore_on_error(key: &str, result: StoreResult<()>) {
    if let Err(err) = result {
        warn!(key = %key, error = %err, "Store write failed");
    }
}
