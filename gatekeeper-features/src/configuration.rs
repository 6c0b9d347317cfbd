//! Feature configuration
//!
//! Defines the three independent gating rules a feature can carry.

use std::fmt;
use std::sync::Arc;

/// Caller-supplied predicate over the device identity.
///
/// Implemented for any `Fn(&str) -> bool + Send + Sync`. The predicate is
/// invoked at most once per query, never retried, and a panic inside it
/// propagates to the caller of the query.
pub trait CustomFilter: Send + Sync {
    fn evaluate(&self, device_id: &str) -> bool;
}

impl<F> CustomFilter for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn evaluate(&self, device_id: &str) -> bool {
        self(device_id)
    }
}

/// Gating configuration for one feature
///
/// Every rule is optional. A configuration with no rules set allows the
/// feature unconditionally.
///
/// # Examples
///
/// ```
/// use gatekeeper_features::FeatureConfiguration;
///
/// // 25% of installs, for the first 30 days after first use
/// let config = FeatureConfiguration::percentage(25.0).with_expiration_days(30);
/// assert_eq!(config.traffic_percentage(), Some(25.0));
/// assert_eq!(config.expiration_days(), Some(30));
/// ```
#[derive(Clone, Default)]
pub struct FeatureConfiguration {
    traffic_percentage: Option<f64>,
    expiration_days: Option<u32>,
    custom_filter: Option<Arc<dyn CustomFilter>>,
}

impl FeatureConfiguration {
    /// A configuration with no rules (always allowed).
    pub fn new() -> Self {
        Self::default()
    }

    /// Roll out to `percentage` percent of installs.
    pub fn percentage(percentage: f64) -> Self {
        Self::new().with_traffic_percentage(percentage)
    }

    /// Allow for `days` days after the feature is first checked.
    pub fn expiration(days: u32) -> Self {
        Self::new().with_expiration_days(days)
    }

    /// Allow when `filter` accepts the device identity.
    pub fn filter(filter: impl CustomFilter + 'static) -> Self {
        Self::new().with_custom_filter(filter)
    }

    /// Set the rollout percentage, clamped to `[0, 100]`. NaN is treated as 0.
    pub fn with_traffic_percentage(mut self, percentage: f64) -> Self {
        let percentage = if percentage.is_nan() {
            0.0
        } else {
            percentage.clamp(0.0, 100.0)
        };
        self.traffic_percentage = Some(percentage);
        self
    }

    pub fn with_expiration_days(mut self, days: u32) -> Self {
        self.expiration_days = Some(days);
        self
    }

    pub fn with_custom_filter(mut self, filter: impl CustomFilter + 'static) -> Self {
        self.custom_filter = Some(Arc::new(filter));
        self
    }

    /// Share an existing filter between configurations.
    pub fn with_shared_filter(mut self, filter: Arc<dyn CustomFilter>) -> Self {
        self.custom_filter = Some(filter);
        self
    }

    pub fn traffic_percentage(&self) -> Option<f64> {
        self.traffic_percentage
    }

    pub fn expiration_days(&self) -> Option<u32> {
        self.expiration_days
    }

    pub fn custom_filter(&self) -> Option<&Arc<dyn CustomFilter>> {
        self.custom_filter.as_ref()
    }

    /// Whether no rule is set.
    pub fn is_unrestricted(&self) -> bool {
        self.traffic_percentage.is_none()
            && self.expiration_days.is_none()
            && self.custom_filter.is_none()
    }
}

impl fmt::Debug for FeatureConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureConfiguration")
            .field("traffic_percentage", &self.traffic_percentage)
            .field("expiration_days", &self.expiration_days)
            .field("custom_filter", &self.custom_filter.as_ref().map(|_| "<fn>"))
            .finish()
    }
}
