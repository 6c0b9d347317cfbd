//! Namespaced key layout.
//!
//! Every key the gatekeeper writes lives under one namespace:
//!
//! ```text
//! <namespace>.deviceId
//! <namespace>.firstSeen.<deviceId>
//! <namespace>.percentage.<featureName>.<deviceId>
//! ```
//!
//! Existing installs depend on this exact shape, so it must not change.

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "com.sdkgatekeeper";

/// Builds the keys for one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpace {
    namespace: String,
}

impl KeySpace {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn device_id(&self) -> String {
        format!("{}.deviceId", self.namespace)
    }

    pub fn first_seen(&self, device_id: &str) -> String {
        format!("{}.firstSeen.{}", self.namespace, device_id)
    }

    pub fn percentage(&self, feature: &str, device_id: &str) -> String {
        format!("{}.percentage.{}.{}", self.namespace, feature, device_id)
    }

    /// Prefix shared by every bucket assignment.
    pub fn percentage_prefix(&self) -> String {
        format!("{}.percentage.", self.namespace)
    }

    /// Prefix shared by every key this namespace owns.
    pub fn root_prefix(&self) -> String {
        format!("{}.", self.namespace)
    }

    /// Whether `key` is a bucket assignment belonging to `device_id`.
    pub fn is_percentage_key_for(&self, key: &str, device_id: &str) -> bool {
        key.strip_prefix(&self.percentage_prefix())
            .and_then(|rest| rest.strip_suffix(device_id))
            .is_some_and(|feature| feature.len() > 1 && feature.ends_with('.'))
    }
}

impl Default for KeySpace {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}
