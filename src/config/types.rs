//! Configuration types for skip-cla
//!
//! This module defines the configuration structure that can be loaded from
//! TOML files and/or environment variables.

use crate::allowlist::Grammar;
use serde::Deserialize;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Server/transport settings
    pub server: ServerConfig,

    /// Allowlist matcher settings
    pub allowlist: AllowlistConfig,

    /// Organization record source
    pub store: StoreConfig,

    /// Request metrics settings
    pub metrics: MetricsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server/transport configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Transport mode
    pub transport: TransportMode,

    /// HTTP host (for http transport)
    pub host: String,

    /// HTTP port (for http transport)
    pub port: u16,

    /// Service name reported by the health endpoint
    pub name: String,

    /// Service version reported by the health endpoint
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: TransportMode::Stdio,
            host: "127.0.0.1".to_string(),
            port: 20290,
            name: "skip-cla".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Transport mode selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// JSON lines over standard input/output
    #[default]
    Stdio,
    /// HTTP API
    Http,
}

/// Allowlist matcher configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AllowlistConfig {
    /// Grammar used to read `skip_cla` values
    pub grammar: Grammar,

    /// Share compiled regexes across calls
    pub cache_patterns: bool,
}

impl Default for AllowlistConfig {
    fn default() -> Self {
        Self {
            grammar: Grammar::Extended,
            cache_patterns: true,
        }
    }
}

/// Organization store configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON file holding an array of organization records
    pub organizations_path: Option<String>,
}

/// Request metrics configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Lifetime of a request timing entry in seconds
    pub ttl_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.transport, TransportMode::Stdio);
        assert_eq!(config.server.port, 20290);
        assert_eq!(config.allowlist.grammar, Grammar::Extended);
        assert!(config.allowlist.cache_patterns);
        assert_eq!(config.metrics.ttl_secs, 300);
        assert!(config.store.organizations_path.is_none());
    }

    #[test]
    fn test_deserialize_grammar() {
        let grammar: Grammar = serde_json::from_str(r#""simple""#).unwrap();
        assert_eq!(grammar, Grammar::Simple);

        let grammar: Grammar = serde_json::from_str(r#""extended""#).unwrap();
        assert_eq!(grammar, Grammar::Extended);
    }

    #[test]
    fn test_deserialize_log_format() {
        let format: LogFormat = serde_json::from_str(r#""json""#).unwrap();
        assert_eq!(format, LogFormat::Json);
    }
}
