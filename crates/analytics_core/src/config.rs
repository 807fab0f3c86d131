//! Client configuration.
//!
//! The core only reads [`Config::opt_out`]; everything else is passed
//! through to plugin `setup` so destinations can pick up their transport
//! settings. Configuration can be built in code or loaded from TOML.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Log levels accepted by [`Config::log_level`]
pub const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_server_url() -> String {
    "https://api2.amplitude.com/2/httpapi".to_string()
}

fn default_flush_interval_millis() -> u64 {
    10_000
}

fn default_flush_queue_size() -> usize {
    200
}

fn default_flush_max_retries() -> u32 {
    12
}

/// Process-wide client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Project API key destinations authenticate with
    pub api_key: String,
    /// When true every dispatched event is skipped locally
    #[serde(default)]
    pub opt_out: bool,
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_logs: bool,
    /// Ingestion endpoint used by destination plugins
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Upper bound on how long a destination may hold events before sending
    #[serde(default = "default_flush_interval_millis")]
    pub flush_interval_millis: u64,
    /// Number of buffered events that triggers a send
    #[serde(default = "default_flush_queue_size")]
    pub flush_queue_size: usize,
    /// Delivery attempts a destination makes before giving up
    #[serde(default = "default_flush_max_retries")]
    pub flush_max_retries: u32,
    /// Whether destinations should use the batch endpoint
    #[serde(default)]
    pub use_batch: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            opt_out: false,
            log_level: default_log_level(),
            json_logs: false,
            server_url: default_server_url(),
            flush_interval_millis: default_flush_interval_millis(),
            flush_queue_size: default_flush_queue_size(),
            flush_max_retries: default_flush_max_retries(),
            use_batch: false,
        }
    }
}

impl Config {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Parses a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Loads a configuration from a TOML file.
    pub async fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("Loading configuration from {}", path.display());
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_toml_str(&content)
    }

    /// Validates the configuration for consistency and correctness.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid("api_key cannot be empty".to_string()));
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level: {}. Must be one of: {VALID_LOG_LEVELS:?}",
                self.log_level
            )));
        }

        if self.flush_queue_size == 0 {
            return Err(ConfigError::Invalid(
                "flush_queue_size must be greater than zero".to_string(),
            ));
        }

        if !(self.server_url.starts_with("https://") || self.server_url.starts_with("http://")) {
            return Err(ConfigError::Invalid(format!(
                "Invalid server url: {}",
                self.server_url
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();

        assert!(config.api_key.is_empty());
        assert!(!config.opt_out);
        assert_eq!(config.log_level, "warn");
        assert!(!config.json_logs);
        assert_eq!(config.flush_interval_millis, 10_000);
        assert_eq!(config.flush_queue_size, 200);
        assert_eq!(config.flush_max_retries, 12);
        assert!(!config.use_batch);
    }

    #[test]
    fn test_serde_deserialization_with_defaults() {
        let config = Config::from_toml_str(r#"api_key = "key-123""#).unwrap();

        assert_eq!(config, Config::new("key-123"));
    }

    #[test]
    fn test_full_toml() {
        let toml_content = r#"
api_key = "key-123"
opt_out = true
log_level = "debug"
json_logs = true
server_url = "http://localhost:9000/ingest"
flush_interval_millis = 250
flush_queue_size = 10
flush_max_retries = 3
use_batch = true
"#;

        let config = Config::from_toml_str(toml_content).unwrap();

        assert!(config.opt_out);
        assert_eq!(config.log_level, "debug");
        assert!(config.json_logs);
        assert_eq!(config.server_url, "http://localhost:9000/ingest");
        assert_eq!(config.flush_interval_millis, 250);
        assert_eq!(config.flush_queue_size, 10);
        assert_eq!(config.flush_max_retries, 3);
        assert!(config.use_batch);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_api_key_fails_to_parse() {
        let result = Config::from_toml_str("opt_out = true");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[tokio::test]
    async fn test_load_from_existing_file() {
        let temp_file = NamedTempFile::new().unwrap();
        tokio::fs::write(temp_file.path(), "api_key = \"from-file\"\nflush_queue_size = 5\n")
            .await
            .unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();

        assert_eq!(config.api_key, "from-file");
        assert_eq!(config.flush_queue_size, 5);
    }

    #[tokio::test]
    async fn test_load_from_nonexistent_file() {
        let result = Config::load_from_file("definitely_missing_analytics.toml").await;
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(Config::new("key").validate().is_ok());
    }

    #[test]
    fn test_validation_empty_api_key() {
        let err = Config::default().validate().unwrap_err();
        assert!(err.to_string().contains("api_key cannot be empty"));
    }

    #[test]
    fn test_validation_invalid_log_level() {
        let mut config = Config::new("key");
        config.log_level = "verbose".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_validation_valid_log_levels() {
        for level in &VALID_LOG_LEVELS {
            let mut config = Config::new("key");
            config.log_level = level.to_string();
            assert!(config.validate().is_ok(), "Level '{}' should be valid", level);
        }
    }

    #[test]
    fn test_validation_zero_queue_size() {
        let mut config = Config::new("key");
        config.flush_queue_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_bad_server_url() {
        let mut config = Config::new("key");
        config.server_url = "ftp://example.com".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid server url"));
    }
}
