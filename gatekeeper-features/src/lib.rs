//! SDK Gatekeeper
//!
//! Decides, per installation, whether a named feature or SDK is active. Each
//! feature can combine three gating rules:
//!
//! - ⏳ **Expiration** - allowed for N days after the feature is first checked
//! - 🎲 **Percentage rollout** - a one-time random draw, frozen per device
//! - 🎯 **Custom filter** - an arbitrary predicate over the device identity
//!
//! Rules are evaluated in that order and the first verdict wins. Features
//! that were never configured are denied.
//!
//! Decisions are durable: the device identity, first-seen time and bucket
//! assignment are written to a [`KeyValueStore`](gatekeeper_store::KeyValueStore),
//! so a device keeps the same answer across launches.
//!
//! # Quick Start
//!
//! ```
//! use gatekeeper_features::*;
//!
//! let gatekeeper = Gatekeeper::builder().build();
//!
//! // Roll out to 25% of installs
//! gatekeeper.configure("new-analytics", FeatureConfiguration::percentage(25.0));
//!
//! // Only for the first two weeks after first use
//! gatekeeper.configure("onboarding-tips", FeatureConfiguration::expiration(14));
//!
//! // Custom predicate over the device identity
//! gatekeeper.configure(
//!     "crash-reporter",
//!     FeatureConfiguration::filter(|device_id: &str| !device_id.is_empty()),
//! );
//!
//! if gatekeeper.should_allow("new-analytics") {
//!     // start the SDK
//! }
//! ```
//!
//! # Persistent Decisions
//!
//! ```no_run
//! use gatekeeper_features::*;
//! use gatekeeper_store::FileStore;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), GatekeeperError> {
//! let store = Arc::new(FileStore::with_path("gatekeeper.json")?);
//! let gatekeeper = Gatekeeper::new(store);
//! gatekeeper.configure("maps", FeatureConfiguration::percentage(10.0));
//!
//! // Same answer on every launch of this install
//! let allowed = gatekeeper.should_allow("maps");
//! # let _ = allowed;
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod configuration;
pub mod error;
pub mod gatekeeper;
pub mod identity;
pub mod keys;
pub mod persistence;
pub mod random;
pub mod settings;

pub use clock::{Clock, ManualClock, SystemClock};
pub use configuration::{CustomFilter, FeatureConfiguration};
pub use error::{GatekeeperError, GatekeeperResult};
pub use gatekeeper::{Decision, DecisionRule, Gatekeeper, GatekeeperBuilder};
pub use identity::{DeviceIdentity, DeviceIdentityStore, IdGenerator, UuidGenerator};
pub use keys::{DEFAULT_NAMESPACE, KeySpace};
pub use persistence::DecisionStore;
pub use random::{RandomSource, ThreadRandom};
pub use settings::{FeatureSettings, GatekeeperSettings, StorageSettings};
