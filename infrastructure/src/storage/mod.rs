//! Transcript persistence.
//!
//! Provides [`JsonlTranscriptStore`], a per-session JSONL writer that
//! implements the [`TranscriptStore`](chatrelay_application::TranscriptStore)
//! port.

mod jsonl_store;

pub use jsonl_store::{JsonlTranscriptStore, Role, TranscriptRecord};
