//! Port for persisting what was asked and what was generated.
//!
//! Storage is a collaborator of the relay, not part of it: failures are
//! reported back as [`StoreError`] and the relay only logs them.

use async_trait::async_trait;
use chatrelay_domain::{Prompt, SessionId, TerminalReason};
use thiserror::Error;

/// Errors that can occur while persisting a transcript
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Persistence for prompts and generated replies.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Record the user's prompt before generation starts.
    ///
    /// Stores that keep conversation titles derive one here when this is
    /// the session's first message.
    async fn record_prompt(
        &self,
        session_id: &SessionId,
        prompt: &Prompt,
    ) -> Result<(), StoreError>;

    /// Record the accumulated reply, tagged with how the generation ended.
    ///
    /// Called exactly once per generation, including cancelled and failed
    /// ones, with whatever text was produced.
    async fn record_reply(
        &self,
        session_id: &SessionId,
        text: &str,
        reason: TerminalReason,
    ) -> Result<(), StoreError>;
}

/// No-op store for when persistence is disabled.
pub struct NoTranscriptStore;

#[async_trait]
impl TranscriptStore for NoTranscriptStore {
    async fn record_prompt(
        &self,
        _session_id: &SessionId,
        _prompt: &Prompt,
    ) -> Result<(), StoreError> {
        Ok(())
    }

    async fn record_reply(
        &self,
        _session_id: &SessionId,
        _text: &str,
        _reason: TerminalReason,
    ) -> Result<(), StoreError> {
        Ok(())
    }
}
