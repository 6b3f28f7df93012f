//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into runtime settings by
//! the binary.

use chatrelay_domain::TerminalMarkers;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("backend.connect_timeout_seconds cannot be 0")]
    InvalidTimeout,

    #[error("backend.url cannot be empty")]
    EmptyBackendUrl,

    #[error("backend.model cannot be empty")]
    EmptyModelName,

    #[error("server.channel_capacity cannot be 0")]
    InvalidChannelCapacity,

    #[error("server.bind is not a socket address: {0}")]
    InvalidBind(String),

    #[error("markers: {0}")]
    InvalidMarkers(String),
}

/// Generation backend settings (`[backend]`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendConfig {
    /// Full URL of the streaming generate endpoint
    pub url: String,
    /// Model name sent with every request
    pub model: String,
    /// Connect timeout in seconds
    pub connect_timeout_seconds: u64,
    /// Sampling options, forwarded verbatim as the request's `options`
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl Default for FileBackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434/api/generate".to_string(),
            model: "gemma3:1b".to_string(),
            connect_timeout_seconds: 10,
            options: serde_json::Map::new(),
        }
    }
}

/// HTTP server settings (`[server]`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileServerConfig {
    /// Listen address
    pub bind: String,
    /// Writes buffered between a generation and its HTTP response body
    pub channel_capacity: usize,
    /// Allow cross-origin requests from any origin
    pub cors: bool,
}

impl Default for FileServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3001".to_string(),
            channel_capacity: 1,
            cors: true,
        }
    }
}

/// Transcript persistence settings (`[storage]`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStorageConfig {
    /// Directory for per-session JSONL transcripts; unset disables persistence
    pub transcript_dir: Option<PathBuf>,
}

/// Terminal marker text (`[markers]`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileMarkersConfig {
    pub completed: String,
    pub cancelled: String,
    pub failed: String,
}

impl Default for FileMarkersConfig {
    fn default() -> Self {
        Self {
            completed: TerminalMarkers::DEFAULT_COMPLETED.to_string(),
            cancelled: TerminalMarkers::DEFAULT_CANCELLED.to_string(),
            failed: TerminalMarkers::DEFAULT_FAILED.to_string(),
        }
    }
}

impl FileMarkersConfig {
    /// Build validated markers.
    pub fn to_markers(&self) -> Result<TerminalMarkers, ConfigValidationError> {
        TerminalMarkers::new(&*self.completed, &*self.cancelled, &*self.failed)
            .map_err(|e| ConfigValidationError::InvalidMarkers(e.to_string()))
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub backend: FileBackendConfig,
    pub server: FileServerConfig,
    pub storage: FileStorageConfig,
    pub markers: FileMarkersConfig,
}

impl FileConfig {
    /// Validate the configuration, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.backend.url.trim().is_empty() {
            return Err(ConfigValidationError::EmptyBackendUrl);
        }
        if self.backend.model.trim().is_empty() {
            return Err(ConfigValidationError::EmptyModelName);
        }
        if self.backend.connect_timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        if self.server.channel_capacity == 0 {
            return Err(ConfigValidationError::InvalidChannelCapacity);
        }
        if self.server.bind.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigValidationError::InvalidBind(self.server.bind.clone()));
        }
        self.markers.to_markers()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[backend]
url = "http://gpu-box:11434/api/generate"
model = "llama3.2"
connect_timeout_seconds = 3

[backend.options]
temperature = 0.8
top_k = 40

[server]
bind = "0.0.0.0:8080"
channel_capacity = 4
cors = false

[storage]
transcript_dir = "/var/lib/chatrelay"

[markers]
completed = "\n<eos>"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.backend.url, "http://gpu-box:11434/api/generate");
        assert_eq!(config.backend.model, "llama3.2");
        assert_eq!(config.backend.connect_timeout_seconds, 3);
        assert_eq!(config.backend.options["top_k"], serde_json::json!(40));
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.server.channel_capacity, 4);
        assert!(!config.server.cors);
        assert_eq!(
            config.storage.transcript_dir,
            Some(PathBuf::from("/var/lib/chatrelay"))
        );
        assert_eq!(config.markers.completed, "\n<eos>");
        // Unset markers keep their defaults
        assert_eq!(config.markers.cancelled, "\n[STOPPED]");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: FileConfig = toml::from_str("[backend]\nmodel = \"qwen3\"\n").unwrap();
        assert_eq!(config.backend.model, "qwen3");
        assert_eq!(config.backend.url, "http://localhost:11434/api/generate");
        assert_eq!(config.server.channel_capacity, 1);
        assert!(config.storage.transcript_dir.is_none());
    }

    #[test]
    fn test_example_config_parses_and_validates() {
        let config: FileConfig =
            toml::from_str(include_str!("../../../chatrelay.example.toml")).unwrap();
        assert_eq!(config.backend.options["mirostat"], serde_json::json!(2));
        assert_eq!(config.markers, FileMarkersConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = FileConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.markers.to_markers().unwrap(), TerminalMarkers::default());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = FileConfig::default();
        config.backend.connect_timeout_seconds = 0;
        assert_eq!(config.validate(), Err(ConfigValidationError::InvalidTimeout));
    }

    #[test]
    fn test_validate_rejects_empty_backend_fields() {
        let mut config = FileConfig::default();
        config.backend.model = "  ".to_string();
        assert_eq!(config.validate(), Err(ConfigValidationError::EmptyModelName));

        let mut config = FileConfig::default();
        config.backend.url = String::new();
        assert_eq!(config.validate(), Err(ConfigValidationError::EmptyBackendUrl));
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let mut config = FileConfig::default();
        config.server.channel_capacity = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::InvalidChannelCapacity)
        );
    }

    #[test]
    fn test_validate_rejects_bad_bind() {
        let mut config = FileConfig::default();
        config.server.bind = "localhost".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidBind(_))
        ));
    }

    #[test]
    fn test_validate_rejects_duplicate_or_empty_markers() {
        let mut config = FileConfig::default();
        config.markers.failed = config.markers.cancelled.clone();
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidMarkers(_))
        ));

        let mut config = FileConfig::default();
        config.markers.completed = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidMarkers(_))
        ));
    }
}
