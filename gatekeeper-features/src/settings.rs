//! Gatekeeper settings
//!
//! Declarative setup loaded from TOML with environment overrides. Custom
//! filters are code, so they are registered on the built [`Gatekeeper`]
//! afterwards.
//!
//! ```toml
//! namespace = "com.sdkgatekeeper"
//!
//! [storage]
//! backend = "file"
//! path = "gatekeeper.json"
//!
//! [features.analytics]
//! traffic_percentage = 25.0
//!
//! [features.crash-reporter]
//! expiration_days = 30
//! ```

use crate::configuration::FeatureConfiguration;
use crate::error::{GatekeeperError, GatekeeperResult};
use crate::gatekeeper::Gatekeeper;
use crate::keys::DEFAULT_NAMESPACE;
use gatekeeper_store::{FileStore, KeyValueStore, MemoryStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Environment variable overriding the namespace.
pub const ENV_NAMESPACE: &str = "GATEKEEPER_NAMESPACE";

/// Environment variable selecting a file store at the given path.
pub const ENV_STORE_PATH: &str = "GATEKEEPER_STORE_PATH";

/// Storage backend selection
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageSettings {
    /// In-memory store (decisions last for the process only)
    #[default]
    Memory,
    /// JSON file store
    File { path: PathBuf },
}

impl StorageSettings {
    /// Open the configured store.
    pub fn open(&self) -> GatekeeperResult<Arc<dyn KeyValueStore>> {
        match self {
            Self::Memory => Ok(Arc::new(MemoryStore::new())),
            Self::File { path } => Ok(Arc::new(FileStore::with_path(path)?)),
        }
    }
}

/// Declarative rules for one feature
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_days: Option<u32>,
}

impl From<&FeatureSettings> for FeatureConfiguration {
    fn from(settings: &FeatureSettings) -> Self {
        let mut config = FeatureConfiguration::new();
        if let Some(percentage) = settings.traffic_percentage {
            config = config.with_traffic_percentage(percentage);
        }
        if let Some(days) = settings.expiration_days {
            config = config.with_expiration_days(days);
        }
        config
    }
}

/// Top-level gatekeeper settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatekeeperSettings {
    /// Key namespace
    pub namespace: String,
    /// Storage backend
    pub storage: StorageSettings,
    /// Feature rules keyed by feature name
    pub features: BTreeMap<String, FeatureSettings>,
}

impl Default for GatekeeperSettings {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            storage: StorageSettings::default(),
            features: BTreeMap::new(),
        }
    }
}

impl GatekeeperSettings {
    /// Parse settings from a TOML document.
    pub fn from_toml_str(raw: &str) -> GatekeeperResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Load settings from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> GatekeeperResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        debug!(path = ?path, "Loaded gatekeeper settings file");
        Self::from_toml_str(&raw)
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().apply_env()
    }

    /// Apply `GATEKEEPER_NAMESPACE` and `GATEKEEPER_STORE_PATH` when set.
    pub fn apply_env(self) -> Self {
        self.apply_overrides(env::var(ENV_NAMESPACE).ok(), env::var(ENV_STORE_PATH).ok())
    }

    fn apply_overrides(mut self, namespace: Option<String>, store_path: Option<String>) -> Self {
        if let Some(namespace) = namespace.filter(|v| !v.trim().is_empty()) {
            self.namespace = namespace.trim().to_string();
        }
        if let Some(path) = store_path.filter(|v| !v.trim().is_empty()) {
            self.storage = StorageSettings::File {
                path: PathBuf::from(path.trim()),
            };
        }
        self
    }

    /// Add or replace the rules for a feature.
    pub fn with_feature(mut self, name: impl Into<String>, feature: FeatureSettings) -> Self {
        self.features.insert(name.into(), feature);
        self
    }

    /// Check the settings for values the gatekeeper cannot honour.
    pub fn validate(&self) -> GatekeeperResult<()> {
        if self.namespace.is_empty() {
            return Err(GatekeeperError::config("namespace must not be empty"));
        }
        if self.namespace.starts_with('.') || self.namespace.ends_with('.') {
            return Err(GatekeeperError::config(format!(
                "namespace '{}' must not start or end with '.'",
                self.namespace
            )));
        }

        for (name, feature) in &self.features {
            if name.is_empty() {
                return Err(GatekeeperError::config("feature name must not be empty"));
            }
            if let Some(percentage) = feature.traffic_percentage
                && !(0.0..=100.0).contains(&percentage)
            {
                return Err(GatekeeperError::config(format!(
                    "feature '{}': traffic_percentage {} is outside 0..=100",
                    name, percentage
                )));
            }
        }

        Ok(())
    }

    /// Validate, open the store, and register every declared feature.
    pub fn build(&self) -> GatekeeperResult<Gatekeeper> {
        self.validate()?;
        let store = self.storage.open()?;

        let gatekeeper = Gatekeeper::builder()
            .namespace(self.namespace.clone())
            .store(store)
            .build();
        for (name, feature) in &self.features {
            gatekeeper.configure(name.clone(), FeatureConfiguration::from(feature));
        }

        info!(
            namespace = %self.namespace,
            features = self.features.len(),
            "Gatekeeper built from settings"
        );
        Ok(gatekeeper)
    }
}
