//! Configuration management for ragdesk
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{Result, RagdeskError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for ragdesk
///
/// Holds the remote service endpoints, chat history limits, upload admission
/// rules and the storage location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote service endpoints
    #[serde(default)]
    pub services: ServicesConfig,

    /// Chat history behavior
    #[serde(default)]
    pub history: HistoryConfig,

    /// Upload admission and polling behavior
    #[serde(default)]
    pub uploads: UploadsConfig,

    /// Durable storage location
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Remote service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// Base URL of the question-answering service (`POST /query`)
    #[serde(default = "default_query_url")]
    pub query_url: String,

    /// Base URL of the upload service (`POST /upload`, `GET /status/{id}`)
    #[serde(default = "default_upload_url")]
    pub upload_url: String,

    /// Timeout applied to every HTTP request (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_query_url() -> String {
    "http://localhost:8002".to_string()
}

fn default_upload_url() -> String {
    "http://localhost:8004".to_string()
}

fn default_request_timeout() -> u64 {
    60
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            query_url: default_query_url(),
            upload_url: default_upload_url(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl ServicesConfig {
    /// Request timeout as a [`Duration`]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Chat history configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of sessions kept in the persisted history
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Maximum title length in characters, ellipsis included
    #[serde(default = "default_title_max_chars")]
    pub title_max_chars: usize,

    /// Number of retrieval chunks requested per question
    #[serde(default = "default_num_chunks")]
    pub num_chunks: u32,
}

fn default_max_sessions() -> usize {
    10
}

fn default_title_max_chars() -> usize {
    30
}

fn default_num_chunks() -> u32 {
    10
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            title_max_chars: default_title_max_chars(),
            num_chunks: default_num_chunks(),
        }
    }
}

/// Upload admission and polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadsConfig {
    /// File extensions accepted for upload (compared case-insensitively)
    #[serde(default = "default_accepted_extensions")]
    pub accepted_extensions: Vec<String>,

    /// Maximum accepted file size (bytes)
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,

    /// Delay between two status polls of a processing job (milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_accepted_extensions() -> Vec<String> {
    vec!["pdf".to_string()]
}

fn default_max_file_size() -> u64 {
    50 * 1024 * 1024 // 50 MiB
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            accepted_extensions: default_accepted_extensions(),
            max_file_size_bytes: default_max_file_size(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl UploadsConfig {
    /// Poll interval as a [`Duration`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Durable storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the SQLite file; the platform data directory is used when unset
    #[serde(default)]
    pub path: Option<String>,
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RagdeskError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| RagdeskError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(query_url) = std::env::var("RAGDESK_QUERY_URL") {
            self.services.query_url = query_url;
        }

        if let Ok(upload_url) = std::env::var("RAGDESK_UPLOAD_URL") {
            self.services.upload_url = upload_url;
        }

        if let Ok(max_sessions) = std::env::var("RAGDESK_MAX_SESSIONS") {
            if let Ok(value) = max_sessions.parse() {
                self.history.max_sessions = value;
            } else {
                tracing::warn!("Invalid RAGDESK_MAX_SESSIONS: {}", max_sessions);
            }
        }

        if let Ok(num_chunks) = std::env::var("RAGDESK_NUM_CHUNKS") {
            if let Ok(value) = num_chunks.parse() {
                self.history.num_chunks = value;
            } else {
                tracing::warn!("Invalid RAGDESK_NUM_CHUNKS: {}", num_chunks);
            }
        }

        if let Ok(interval) = std::env::var("RAGDESK_POLL_INTERVAL_MS") {
            if let Ok(value) = interval.parse() {
                self.uploads.poll_interval_ms = value;
            } else {
                tracing::warn!("Invalid RAGDESK_POLL_INTERVAL_MS: {}", interval);
            }
        }

        if let Ok(storage_path) = std::env::var("RAGDESK_STORAGE_PATH") {
            tracing::debug!(storage_path = %storage_path, "Env override: RAGDESK_STORAGE_PATH");
            self.storage.path = Some(storage_path);
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(path) = &cli.storage_path {
            tracing::info!("Using storage override from CLI: {}", path);
            self.storage.path = Some(path.clone());
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("services.query_url", &self.services.query_url),
            ("services.upload_url", &self.services.upload_url),
        ] {
            if value.is_empty() {
                return Err(RagdeskError::Config(format!("{} cannot be empty", name)).into());
            }
            url::Url::parse(value).map_err(|e| {
                RagdeskError::Config(format!("{} is not a valid URL ({}): {}", name, value, e))
            })?;
        }

        if self.services.request_timeout_seconds == 0 {
            return Err(RagdeskError::Config(
                "services.request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.history.max_sessions == 0 {
            return Err(RagdeskError::Config(
                "history.max_sessions must be greater than 0".to_string(),
            )
            .into());
        }

        // Room for at least one character plus the ellipsis.
        if self.history.title_max_chars < 4 {
            return Err(RagdeskError::Config(
                "history.title_max_chars must be at least 4".to_string(),
            )
            .into());
        }

        if self.history.num_chunks == 0 {
            return Err(
                RagdeskError::Config("history.num_chunks must be greater than 0".to_string())
                    .into(),
            );
        }

        if self.uploads.accepted_extensions.is_empty() {
            return Err(RagdeskError::Config(
                "uploads.accepted_extensions cannot be empty".to_string(),
            )
            .into());
        }

        if self.uploads.max_file_size_bytes == 0 {
            return Err(RagdeskError::Config(
                "uploads.max_file_size_bytes must be greater than 0".to_string(),
            )
            .into());
        }

        if self.uploads.poll_interval_ms == 0 {
            return Err(RagdeskError::Config(
                "uploads.poll_interval_ms must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.services.query_url, "http://localhost:8002");
        assert_eq!(config.services.upload_url, "http://localhost:8004");
        assert_eq!(config.history.max_sessions, 10);
        assert_eq!(config.history.title_max_chars, 30);
        assert_eq!(config.history.num_chunks, 10);
        assert_eq!(config.uploads.max_file_size_bytes, 52_428_800);
        assert_eq!(config.uploads.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.uploads.accepted_extensions, vec!["pdf".to_string()]);
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_url() {
        let mut config = Config::default();
        config.services.query_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.services.upload_url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_max_sessions() {
        let mut config = Config::default();
        config.history.max_sessions = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_title_too_short() {
        let mut config = Config::default();
        config.history.title_max_chars = 3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_poll_interval() {
        let mut config = Config::default();
        config.uploads.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_empty_extensions() {
        let mut config = Config::default();
        config.uploads.accepted_extensions.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
services:
  query_url: http://rag.internal:9002
  upload_url: http://rag.internal:9004
history:
  max_sessions: 25
  title_max_chars: 50
uploads:
  accepted_extensions: [pdf, PDF]
  poll_interval_ms: 500
storage:
  path: /tmp/ragdesk.db
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.services.query_url, "http://rag.internal:9002");
        assert_eq!(config.services.request_timeout_seconds, 60);
        assert_eq!(config.history.max_sessions, 25);
        assert_eq!(config.history.title_max_chars, 50);
        assert_eq!(config.history.num_chunks, 10);
        assert_eq!(config.uploads.poll_interval_ms, 500);
        assert_eq!(config.uploads.max_file_size_bytes, 52_428_800);
        assert_eq!(config.storage.path.as_deref(), Some("/tmp/ragdesk.db"));
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.history.max_sessions, 10);
        assert!(config.storage.path.is_none());
    }

    #[test]
    #[serial]
    fn test_load_nonexistent_file_uses_defaults() {
        let cli = crate::cli::Cli::default();
        let config = Config::load("/nonexistent/ragdesk/config.yaml", &cli).unwrap();
        assert_eq!(config.history.max_sessions, 10);
    }

    #[test]
    #[serial]
    fn test_apply_env_vars_overrides_fields() {
        std::env::set_var("RAGDESK_QUERY_URL", "http://env-query:1");
        std::env::set_var("RAGDESK_MAX_SESSIONS", "3");
        std::env::set_var("RAGDESK_POLL_INTERVAL_MS", "not-a-number");

        let mut config = Config::default();
        config.apply_env_vars();

        std::env::remove_var("RAGDESK_QUERY_URL");
        std::env::remove_var("RAGDESK_MAX_SESSIONS");
        std::env::remove_var("RAGDESK_POLL_INTERVAL_MS");

        assert_eq!(config.services.query_url, "http://env-query:1");
        assert_eq!(config.history.max_sessions, 3);
        // Invalid numbers keep the previous value.
        assert_eq!(config.uploads.poll_interval_ms, 2_000);
    }

    #[test]
    #[serial]
    fn test_cli_storage_path_override() {
        let cli = crate::cli::Cli {
            storage_path: Some("/tmp/cli.db".to_string()),
            ..Default::default()
        };
        let mut config = Config::default();
        config.apply_cli_overrides(&cli);
        assert_eq!(config.storage.path.as_deref(), Some("/tmp/cli.db"));
    }
}
