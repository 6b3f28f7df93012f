//! Presentation layer for chatrelay
//!
//! This crate contains the CLI definitions, the console sink used by `ask`,
//! and the HTTP surface used by `serve`.

pub mod cli;
pub mod http;
pub mod output;

// Re-export commonly used types
pub use cli::commands::{Cli, Command};
pub use http::{ApiError, AppState, create_router};
pub use output::console::ConsoleSink;
