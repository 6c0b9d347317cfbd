//! Device identity
//!
//! Each installation gets one opaque identifier, generated on first use and
//! persisted until the gatekeeper state is wiped.

use crate::keys::KeySpace;
use gatekeeper_store::{KeyValueStore, StoredValue};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Stable identifier for one app installation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceIdentity(String);

impl DeviceIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DeviceIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Generator of globally unique identifiers.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random (v4) UUIDs in upper-case hyphenated form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        uuid::Uuid::new_v4().to_string().to_uppercase()
    }
}

impl<F> IdGenerator for F
where
    F: Fn() -> String + Send + Sync,
{
    fn generate(&self) -> String {
        self()
    }
}

/// Resolves and lazily creates the device identity.
pub struct DeviceIdentityStore {
    store: Arc<dyn KeyValueStore>,
    keys: KeySpace,
    generator: Arc<dyn IdGenerator>,
    create_lock: Mutex<()>,
}

impl DeviceIdentityStore {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        keys: KeySpace,
        generator: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            store,
            keys,
            generator,
            create_lock: Mutex::new(()),
        }
    }

    /// Return the persisted identity, creating and persisting one if absent.
    ///
    /// Concurrent first calls agree on a single identity. If the store cannot
    /// be read the identity is treated as absent; if it cannot be written the
    /// fresh identity is still returned but will not survive a restart.
    pub fn get_or_create(&self) -> DeviceIdentity {
        let key = self.keys.device_id();
        if let Some(existing) = self.read(&key) {
            return existing;
        }

        let _guard = self.create_lock.lock();
        if let Some(existing) = self.read(&key) {
            return existing;
        }

        let identity = DeviceIdentity::new(self.generator.generate());
        if let Err(err) = self.store.set(&key, StoredValue::string(identity.as_str())) {
            warn!(key = %key, error = %err, "Failed to persist device identity");
        }
        debug!(device_id = %identity, "Created device identity");
        identity
    }

    /// The persisted identity, without creating one.
    pub fn current(&self) -> Option<DeviceIdentity> {
        self.read(&self.keys.device_id())
    }

    fn read(&self, key: &str) -> Option<DeviceIdentity> {
        match self.store.get_string(key) {
            Ok(value) => value.map(DeviceIdentity::new),
            Err(err) => {
                warn!(key = %key, error = %err, "Failed to read device identity; treating as absent");
                None
            }
        }
    }
}

impl fmt::Debug for DeviceIdentityStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceIdentityStore")
            .field("keys", &self.keys)
            .field("store", &self.store.store_type())
            .finish()
    }
}
