//! Infrastructure layer for chatrelay
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod ollama;
pub mod storage;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileBackendConfig, FileConfig, FileMarkersConfig,
    FileServerConfig, FileStorageConfig,
};
pub use ollama::{OllamaBackend, OllamaError, OllamaSettings};
pub use storage::{JsonlTranscriptStore, TranscriptRecord};
