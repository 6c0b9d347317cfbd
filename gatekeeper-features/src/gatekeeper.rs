//! Gatekeeper engine
//!
//! Holds one configuration per feature name and composes the gating rules in
//! fixed precedence: expiration, then percentage rollout, then the custom
//! filter, then default allow. The first rule that produces a verdict ends
//! evaluation.

use crate::clock::{Clock, SystemClock};
use crate::configuration::FeatureConfiguration;
use crate::identity::{DeviceIdentity, DeviceIdentityStore, IdGenerator, UuidGenerator};
use crate::keys::{DEFAULT_NAMESPACE, KeySpace};
use crate::persistence::DecisionStore;
use crate::random::{RandomSource, ThreadRandom};
use chrono::{DateTime, TimeDelta, Utc};
use gatekeeper_store::{KeyValueStore, MemoryStore};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Rule that produced a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionRule {
    /// No configuration registered for the feature
    Unconfigured,
    /// Expiration window has passed
    Expiration,
    /// Stored percentage rollout bucket
    Percentage,
    /// Caller-supplied filter
    CustomFilter,
    /// No rule fired
    Default,
}

impl DecisionRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unconfigured => "unconfigured",
            Self::Expiration => "expiration",
            Self::Percentage => "percentage",
            Self::CustomFilter => "custom_filter",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for DecisionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating a feature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Whether the feature is allowed
    pub allowed: bool,
    /// The rule that decided
    pub rule: DecisionRule,
}

impl Decision {
    fn allow(rule: DecisionRule) -> Self {
        Self { allowed: true, rule }
    }

    fn deny(rule: DecisionRule) -> Self {
        Self {
            allowed: false,
            rule,
        }
    }

    fn from_rule(allowed: bool, rule: DecisionRule) -> Self {
        Self { allowed, rule }
    }
}

/// Decides whether named features are active on this installation.
///
/// Build one at startup, before initializing the SDKs it gates, and share it
/// (for example behind an `Arc`) with every caller that needs decisions.
///
/// # Examples
///
/// ```
/// use gatekeeper_features::{FeatureConfiguration, Gatekeeper};
///
/// let gatekeeper = Gatekeeper::builder().build();
/// gatekeeper.configure("analytics", FeatureConfiguration::percentage(100.0));
///
/// assert!(gatekeeper.should_allow("analytics"));
/// assert!(!gatekeeper.should_allow("never-configured"));
/// ```
pub struct Gatekeeper {
    configurations: RwLock<HashMap<String, FeatureConfiguration>>,
    identity: DeviceIdentityStore,
    decisions: DecisionStore,
    clock: Arc<dyn Clock>,
}

impl Gatekeeper {
    /// Create a new gatekeeper builder
    pub fn builder() -> GatekeeperBuilder {
        GatekeeperBuilder::new()
    }

    /// Create a gatekeeper over `store` with default collaborators.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::builder().store(store).build()
    }

    /// Register (or replace) the configuration for `feature`.
    pub fn configure(&self, feature: impl Into<String>, configuration: FeatureConfiguration) {
        let feature = feature.into();
        debug!(feature = %feature, configuration = ?configuration, "Configuring feature");
        self.configurations.write().insert(feature, configuration);
    }

    /// Remove the configuration for `feature`, returning it if present.
    ///
    /// Persisted decision state is kept; re-registering the feature picks it up again.
    pub fn remove_configuration(&self, feature: &str) -> Option<FeatureConfiguration> {
        self.configurations.write().remove(feature)
    }

    /// The configuration registered for `feature`.
    pub fn configuration(&self, feature: &str) -> Option<FeatureConfiguration> {
        self.configurations.read().get(feature).cloned()
    }

    pub fn is_configured(&self, feature: &str) -> bool {
        self.configurations.read().contains_key(feature)
    }

    /// Names of every configured feature, sorted.
    pub fn configured_features(&self) -> Vec<String> {
        let mut names: Vec<String> = self.configurations.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether `feature` is allowed on this installation.
    ///
    /// Unknown features are never allowed.
    pub fn should_allow(&self, feature: &str) -> bool {
        self.evaluate(feature).allowed
    }

    /// Evaluate `feature`, reporting which rule decided.
    pub fn evaluate(&self, feature: &str) -> Decision {
        // Cloned out so the filter never runs under the lock.
        let Some(config) = self.configuration(feature) else {
            trace!(feature = %feature, "Feature not configured; denying");
            return Decision::deny(DecisionRule::Unconfigured);
        };

        let device = self.identity.get_or_create();
        let decision = self.evaluate_rules(feature, &config, &device);

        trace!(
            feature = %feature,
            device_id = %device,
            allowed = decision.allowed,
            rule = %decision.rule,
            "Evaluated feature"
        );
        decision
    }

    fn evaluate_rules(
        &self,
        feature: &str,
        config: &FeatureConfiguration,
        device: &DeviceIdentity,
    ) -> Decision {
        if let Some(days) = config.expiration_days()
            && self.is_expired(device, days)
        {
            return Decision::deny(DecisionRule::Expiration);
        }

        if let Some(percentage) = config.traffic_percentage() {
            let included = self.decisions.assign_bucket(feature, device, percentage);
            return Decision::from_rule(included, DecisionRule::Percentage);
        }

        if let Some(filter) = config.custom_filter() {
            return Decision::from_rule(filter.evaluate(device.as_str()), DecisionRule::CustomFilter);
        }

        Decision::allow(DecisionRule::Default)
    }

    /// A first observation records the current time and is never expired.
    fn is_expired(&self, device: &DeviceIdentity, days: u32) -> bool {
        let now = self.clock.now();
        let Some(first_seen) = self.decisions.first_seen_or_record(device, now) else {
            return false;
        };

        match expiration_deadline(first_seen, days) {
            Some(deadline) => now > deadline,
            None => false,
        }
    }

    /// Clear this device's decision state.
    ///
    /// The device identity and the registered configurations are kept.
    pub fn reset(&self) {
        let device = self.identity.get_or_create();
        self.decisions.reset_device(&device);
    }

    /// Remove all persisted state, including the device identity.
    pub fn wipe_all(&self) {
        self.decisions.wipe_all();
    }

    /// The device identity, created if absent.
    pub fn device_identity(&self) -> DeviceIdentity {
        self.identity.get_or_create()
    }

    pub fn namespace(&self) -> &str {
        self.decisions.keys().namespace()
    }
}

impl fmt::Debug for Gatekeeper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gatekeeper")
            .field("features", &self.configured_features())
            .field("decisions", &self.decisions)
            .finish()
    }
}

fn expiration_deadline(first_seen: DateTime<Utc>, days: u32) -> Option<DateTime<Utc>> {
    first_seen.checked_add_signed(TimeDelta::try_days(i64::from(days))?)
}

/// Builder for [`Gatekeeper`]
pub struct GatekeeperBuilder {
    namespace: String,
    store: Option<Arc<dyn KeyValueStore>>,
    clock: Arc<dyn Clock>,
    id_generator: Arc<dyn IdGenerator>,
    random: Arc<dyn RandomSource>,
}

impl GatekeeperBuilder {
    pub fn new() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            store: None,
            clock: Arc::new(SystemClock),
            id_generator: Arc::new(UuidGenerator),
            random: Arc::new(ThreadRandom),
        }
    }

    /// Set the key namespace
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the backing store (defaults to an in-memory store)
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the time source
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the device identity generator
    pub fn id_generator(mut self, generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = generator;
        self
    }

    /// Set the random source for bucket draws
    pub fn random_source(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Build the gatekeeper
    pub fn build(self) -> Gatekeeper {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>);
        let keys = KeySpace::new(self.namespace);

        debug!(
            namespace = %keys.namespace(),
            store_type = store.store_type(),
            "Building gatekeeper"
        );

        Gatekeeper {
            configurations: RwLock::new(HashMap::new()),
            identity: DeviceIdentityStore::new(store.clone(), keys.clone(), self.id_generator),
            decisions: DecisionStore::new(store, keys, self.random),
            clock: self.clock,
        }
    }
}

impl Default for GatekeeperBuilder {
    fn default() -> Self {
        Self::new()
    }
}
