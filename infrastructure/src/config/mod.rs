//! Configuration file loading for chatrelay
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `CHATRELAY_*` environment variables (`__` separates section and key)
//! 2. `--config <path>` specified file
//! 3. Project root: `./chatrelay.toml` or `./.chatrelay.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/chatrelay/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileBackendConfig, FileConfig, FileMarkersConfig, FileServerConfig,
    FileStorageConfig,
};
pub use loader::ConfigLoader;
