//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for chatrelay
#[derive(Parser, Debug)]
#[command(name = "chatrelay")]
#[command(author, version, about = "Streaming generation relay for Ollama-compatible backends")]
#[command(long_about = r#"
chatrelay streams text from a generation backend to clients as it is
produced, one session at a time, and lets a separate request stop any
session mid-stream.

Every stream ends with exactly one marker:
  [DONE]      the backend finished
  [STOPPED]   a stop request cancelled the generation
  [ERROR: …]  the backend failed

Configuration files are loaded from (in priority order):
1. CHATRELAY_* environment variables
2. --config <path>     Explicit config file
3. ./chatrelay.toml    Project-level config
4. ~/.config/chatrelay/config.toml   Global config

Example:
  chatrelay serve --bind 0.0.0.0:3001
  chatrelay ask "Why is the sky blue?"
  chatrelay ask --session notes "Summarise our last chat"
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP relay
    Serve {
        /// Listen address (overrides server.bind)
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },
    /// Stream one generation to stdout
    Ask {
        /// The prompt to send
        prompt: String,

        /// Session id to run under
        #[arg(short, long, value_name = "ID", default_value = "cli")]
        session: String,
    },
}
