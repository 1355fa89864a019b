//! Configuration loader with layered sources
//!
//! Loads configuration from multiple sources with the following precedence
//! (highest to lowest):
//! 1. Environment variables (SKIP_CLA__*)
//! 2. Configuration file (TOML)
//! 3. Default values

use crate::config::types::AppConfig;
use crate::error::ConfigError;
use config::{Config, Environment, File, FileFormat};
use std::path::Path;

/// Default configuration file paths to check (in order)
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "skip-cla.toml",
    ".skip-cla.toml",
    "~/.config/skip-cla/config.toml",
    "/etc/skip-cla/config.toml",
];

/// Load configuration from a TOML string (useful for testing)
///
/// The organizations file is not required to exist.
pub fn load_config_from_str(toml_str: &str) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config_relaxed(&app_config)?;

    Ok(app_config)
}

/// Load configuration from files and environment
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. Defaults come from serde defaults on AppConfig

    // 2. Configuration file
    if let Some(path) = config_path {
        // Explicit path provided - must exist
        if !Path::new(path).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::new(path, FileFormat::Toml));
    } else {
        // First existing default path wins
        for path in DEFAULT_CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
                break;
            }
        }
    }

    // 3. Environment variables, e.g. SKIP_CLA__SERVER__PORT, SKIP_CLA__ALLOWLIST__GRAMMAR
    builder = builder.add_source(
        Environment::with_prefix("SKIP_CLA")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let mut app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    if let Some(path) = app_config.store.organizations_path.take() {
        app_config.store.organizations_path = Some(shellexpand::tilde(&path).into_owned());
    }

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Validate configuration values that do not touch the filesystem
fn validate_config_relaxed(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::Invalid {
            message: "server.port must be greater than 0".to_string(),
        });
    }

    if config.server.host.is_empty() {
        return Err(ConfigError::Missing {
            field: "server.host".to_string(),
        });
    }

    if config.metrics.ttl_secs == 0 {
        return Err(ConfigError::Invalid {
            message: "metrics.ttl_secs must be greater than 0".to_string(),
        });
    }

    if let Some(path) = &config.store.organizations_path
        && path.trim().is_empty()
    {
        return Err(ConfigError::Invalid {
            message: "store.organizations_path must not be empty when set".to_string(),
        });
    }

    Ok(())
}

/// Validate configuration values
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    validate_config_relaxed(config)?;

    if let Some(path) = &config.store.organizations_path
        && !Path::new(path).exists()
    {
        return Err(ConfigError::Load(format!(
            "Organizations file not found: {}",
            path
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allowlist::Grammar;
    use crate::config::{LogFormat, TransportMode};

    #[test]
    fn test_load_config_from_str_basic() {
        let toml = r#"
[server]
name = "test-server"
transport = "http"
port = 9000

[allowlist]
grammar = "simple"
"#;

        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.server.name, "test-server");
        assert_eq!(config.server.transport, TransportMode::Http);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.allowlist.grammar, Grammar::Simple);
        assert!(config.allowlist.cache_patterns);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.server.transport, TransportMode::Stdio);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.allowlist.grammar, Grammar::Extended);
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let toml = r#"
[metrics]
ttl_secs = 0
"#;
        assert!(matches!(
            load_config_from_str(toml),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_unknown_grammar_rejected() {
        let toml = r#"
[allowlist]
grammar = "fancy"
"#;
        assert!(matches!(
            load_config_from_str(toml),
            Err(ConfigError::Load(_))
        ));
    }

    #[test]
    fn test_missing_organizations_file_rejected() {
        let config = AppConfig {
            store: crate::config::StoreConfig {
                organizations_path: Some("/definitely/not/here.json".to_string()),
            },
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Load(_))
        ));
        assert!(validate_config_relaxed(&config).is_ok());
    }

    #[test]
    fn test_missing_explicit_config_file() {
        let result = load_config(Some("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}
