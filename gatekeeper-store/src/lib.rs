//! Key-value persistence for the SDK gatekeeper.
//!
//! The gatekeeper only needs a small capability from its storage: get, set and
//! remove by string key, plus a prefix scan so per-device and global state can
//! be cleared. This crate defines that capability as [`KeyValueStore`] and ships
//! two backends.
//!
//! - [`MemoryStore`] - DashMap backed, process lifetime only
//! - [`FileStore`] - a single JSON file, survives restarts
//!
//! # Example
//!
//! ```
//! use gatekeeper_store::{KeyValueStore, MemoryStore, StoredValue};
//!
//! let store = MemoryStore::new();
//! store.set("com.example.deviceId", StoredValue::from("A1B2")).unwrap();
//!
//! assert_eq!(
//!     store.get_string("com.example.deviceId").unwrap().as_deref(),
//!     Some("A1B2"),
//! );
//! ```

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;
pub mod value;

pub use error::{StoreError, StoreResult};
pub use file::{FileStore, FileStoreConfig};
pub use memory::MemoryStore;
pub use traits::KeyValueStore;
pub use value::StoredValue;
