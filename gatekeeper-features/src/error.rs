//! Error types for gatekeeper setup
//!
//! Gating queries never fail. These errors only come out of setup paths:
//! loading settings and opening the backing store.

use gatekeeper_store::StoreError;
use thiserror::Error;

/// Result type for gatekeeper setup operations
pub type GatekeeperResult<T> = Result<T, GatekeeperError>;

/// Gatekeeper setup errors
#[derive(Debug, Error)]
pub enum GatekeeperError {
    /// Backing store could not be opened
    #[error("Gatekeeper store error: {0}")]
    Store(#[from] StoreError),

    /// Invalid configuration
    #[error("Gatekeeper configuration error: {0}")]
    Config(String),

    /// Settings could not be parsed
    #[error("Failed to parse gatekeeper settings: {0}")]
    Parse(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatekeeperError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }
}

impl From<toml::de::Error> for GatekeeperError {
    fn from(err: toml::de::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = GatekeeperError::config("namespace must not be empty");
        let display = format!("{}", err);
        assert!(display.contains("namespace must not be empty"));
    }

    #[test]
    fn test_store_error_conversion() {
        let err: GatekeeperError = StoreError::corrupted("bad json").into();
        assert!(matches!(err, GatekeeperError::Store(_)));
    }
}
