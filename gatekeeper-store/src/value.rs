//! Values held by a key-value store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single persisted value.
///
/// Stores only need to round-trip the three shapes the gatekeeper writes:
/// identifiers, bucket assignments, and first-seen timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum StoredValue {
    String(String),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

impl StoredValue {
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    pub fn boolean(value: bool) -> Self {
        Self::Bool(value)
    }

    pub fn timestamp(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Short name of the variant, used in log output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Bool(_) => "bool",
            Self::Timestamp(_) => "timestamp",
        }
    }
}

impl From<String> for StoredValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for StoredValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<bool> for StoredValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<DateTime<Utc>> for StoredValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_accessors_match_variant() {
        let value = StoredValue::boolean(true);
        assert_eq!(value.as_bool(), Some(true));
        assert_eq!(value.as_str(), None);
        assert_eq!(value.as_timestamp(), None);
        assert_eq!(value.kind(), "bool");
    }

    #[test]
    fn test_tagged_json_shape() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let json = serde_json::to_value(StoredValue::timestamp(at)).unwrap();

        assert_eq!(json["type"], "timestamp");
        assert_eq!(json["value"], "2024-03-01T12:00:00Z");

        let json = serde_json::to_value(StoredValue::from("ABC")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "string", "value": "ABC"}));
    }
}
