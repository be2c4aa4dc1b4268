//! Runtime configuration: registry policy and logging.
//!
//! Every field has a default, so a JSON file only needs the keys it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Top-level configuration for a lifecycle runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub registry: RegistryConfig,
    pub logging: LoggingConfig,
}

impl RuntimeConfig {
    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ConfigParse`] if the JSON is malformed or has
    /// fields of the wrong type.
    pub fn from_json_str(json: &str) -> Result<Self, RegistryError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ConfigRead`] if the file cannot be read, or
    /// [`RegistryError::ConfigParse`] if it is not valid configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}

/// Policy for driving a group of services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Stop already started services when a later one fails to start.
    pub rollback_on_start_failure: bool,
    /// Keep stopping (or shutting down) the remaining services after one fails.
    pub continue_on_failure: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            rollback_on_start_failure: true,
            continue_on_failure: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Logging configuration. `RUST_LOG`, when set, takes precedence over `filter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// `EnvFilter` directive, e.g. `"info"` or `"lifecycle_core=debug"`.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            filter: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn runtime_config_defaults() {
        let config = RuntimeConfig::default();
        assert!(config.registry.rollback_on_start_failure);
        assert!(config.registry.continue_on_failure);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config = RuntimeConfig::from_json_str(
            r#"{ "registry": { "continue_on_failure": false }, "logging": { "format": "json" } }"#,
        )
        .unwrap();
        assert!(config.registry.rollback_on_start_failure);
        assert!(!config.registry.continue_on_failure);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn empty_json_object_is_default() {
        assert_eq!(
            RuntimeConfig::from_json_str("{}").unwrap(),
            RuntimeConfig::default()
        );
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = RuntimeConfig::from_json_str(r#"{ "logging": { "format": "xml" } }"#).unwrap_err();
        assert!(matches!(err, RegistryError::ConfigParse(_)));
    }

    #[test]
    fn from_file_reads_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "logging": {{ "filter": "debug" }} }}"#).unwrap();

        let config = RuntimeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn from_missing_file_is_read_error() {
        let err = RuntimeConfig::from_file("/nonexistent/lifecycle.json").unwrap_err();
        assert!(matches!(err, RegistryError::ConfigRead(_)));
    }
}
