//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::PathBuf;

/// Project-level config file names, checked in order
const PROJECT_FILES: [&str; 2] = ["chatrelay.toml", ".chatrelay.toml"];

/// Prefix of environment overrides, e.g. `CHATRELAY_BACKEND__MODEL`
const ENV_PREFIX: &str = "CHATRELAY_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. Environment: `CHATRELAY_<SECTION>__<KEY>`
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./chatrelay.toml` or `./.chatrelay.toml`
    /// 4. XDG config: `$XDG_CONFIG_HOME/chatrelay/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        Self::figment(config_path).extract().map_err(Box::new)
    }

    /// The merged provider chain behind [`load`](Self::load).
    pub fn figment(config_path: Option<&PathBuf>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(&path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/chatrelay/config.toml if set,
    /// otherwise falls back to ~/.config/chatrelay/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("chatrelay").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources(config_path: Option<&PathBuf>) {
        println!("Configuration sources (in priority order):");

        if let Some(path) = config_path {
            let found = if path.exists() { "FOUND" } else { "MISSING" };
            println!("  [{:<7}] Explicit: {}", found, path.display());
        }

        match Self::project_config_path() {
            Some(path) => println!("  [FOUND  ] Project:  {}", path.display()),
            None => println!("  [       ] Project:  ./chatrelay.toml or ./.chatrelay.toml"),
        }

        if let Some(path) = Self::global_config_path() {
            let found = if path.exists() { "FOUND  " } else { "       " };
            println!("  [{}] Global:   {}", found, path.display());
        }

        println!("  [       ] Default:  built-in defaults");
        println!("  Environment overrides: {}<SECTION>__<KEY>", ENV_PREFIX);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.backend.model, "gemma3:1b");
        assert_eq!(config.server.bind, "127.0.0.1:3001");
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("chatrelay"));
    }

    #[test]
    fn test_project_file_then_explicit_then_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "chatrelay.toml",
                r#"
[backend]
model = "from-project"
url = "http://project:11434/api/generate"

[server]
channel_capacity = 2
"#,
            )?;
            jail.create_file(
                "override.toml",
                r#"
[backend]
model = "from-explicit"
"#,
            )?;
            jail.set_env("CHATRELAY_SERVER__CHANNEL_CAPACITY", "8");

            let explicit = PathBuf::from("override.toml");
            let config = ConfigLoader::load(Some(&explicit)).map_err(|e| *e)?;

            assert_eq!(config.backend.model, "from-explicit");
            assert_eq!(config.backend.url, "http://project:11434/api/generate");
            assert_eq!(config.server.channel_capacity, 8);
            // Untouched keys keep defaults
            assert_eq!(config.backend.connect_timeout_seconds, 10);
            Ok(())
        });
    }

    #[test]
    fn test_hidden_project_file_is_found() {
        Jail::expect_with(|jail| {
            jail.create_file(".chatrelay.toml", "[storage]\ntranscript_dir = \"logs\"\n")?;
            let config = ConfigLoader::load(None).map_err(|e| *e)?;
            assert_eq!(config.storage.transcript_dir, Some(PathBuf::from("logs")));
            Ok(())
        });
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        Jail::expect_with(|jail| {
            jail.create_file("chatrelay.toml", "[server]\nchannel_capacity = \"lots\"\n")?;
            assert!(ConfigLoader::load(None).is_err());
            Ok(())
        });
    }
}
