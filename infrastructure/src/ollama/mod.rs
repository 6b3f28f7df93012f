//! Ollama generation backend
//!
//! Implements [`GenerationBackend`](chatrelay_application::GenerationBackend)
//! over Ollama's streaming `/api/generate` endpoint.

pub mod client;
pub mod error;
pub mod protocol;

pub use client::{OllamaBackend, OllamaSettings};
pub use error::OllamaError;
