// SDK Gatekeeper - local, offline gating for SDKs and features
//
// This library decides per installation whether a named feature is active,
// combining expiration, stable percentage rollout and custom predicates, and
// persists every random decision so it survives app restarts.

pub mod logging;

// Re-export the engine
pub use gatekeeper_features::{
    Clock, CustomFilter, DEFAULT_NAMESPACE, Decision, DecisionRule, DecisionStore,
    DeviceIdentity, DeviceIdentityStore, FeatureConfiguration, FeatureSettings, Gatekeeper,
    GatekeeperBuilder, GatekeeperError, GatekeeperResult, GatekeeperSettings, IdGenerator,
    KeySpace, ManualClock, RandomSource, StorageSettings, SystemClock, ThreadRandom,
    UuidGenerator,
};

// Re-export storage backends
pub use gatekeeper_store::{
    FileStore, FileStoreConfig, KeyValueStore, MemoryStore, StoreError, StoreResult, StoredValue,
};

pub use gatekeeper_features;
pub use gatekeeper_store;

pub use logging::{LogConfig, LogFormat, LogLevel, init_logging};
