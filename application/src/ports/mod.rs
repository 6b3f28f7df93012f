//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure and presentation adapters
//! must implement.

pub mod generation_backend;
pub mod output_sink;
pub mod transcript_store;
