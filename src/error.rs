//! Error types for skip-cla
//!
//! The allowlist matcher itself never fails: malformed patterns degrade to
//! "no match" and are only logged. The errors below cover the surfaces around
//! it (configuration, organization lookup, transports).

use thiserror::Error;

/// Errors returned by an allowlist check
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Organization store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Build an `InvalidPattern` error from a regex compilation failure
    pub fn invalid_pattern(pattern: impl Into<String>, err: &regex::Error) -> Self {
        ConfigError::InvalidPattern {
            pattern: pattern.into(),
            reason: err.to_string(),
        }
    }
}

/// Organization lookup errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Organization not found: {organization}")]
    OrganizationNotFound { organization: String },
}

/// Transport layer errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid message format: {0}")]
    InvalidMessage(String),
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pattern_carries_reason() {
        let err = regex::Regex::new("[unclosed").unwrap_err();
        let cfg = ConfigError::invalid_pattern("[unclosed", &err);
        let msg = cfg.to_string();
        assert!(msg.contains("[unclosed"));
        assert!(matches!(cfg, ConfigError::InvalidPattern { .. }));
    }

    #[test]
    fn test_store_error_converts_into_app_error() {
        let err: AppError = StoreError::OrganizationNotFound {
            organization: "acme".into(),
        }
        .into();
        assert!(matches!(err, AppError::Store(_)));
        assert!(err.to_string().contains("acme"));
    }
}
