//! Generation backend port
//!
//! Defines the interface for streaming text out of a generation backend.

use async_trait::async_trait;
use chatrelay_domain::{Fragment, Prompt, SessionId};
use futures::stream::BoxStream;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors that can end a backend stream.
///
/// [`BackendError::Cancelled`] is how an abort surfaces; every other variant
/// is a genuine failure of the backend or the network.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Generation cancelled")]
    Cancelled,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Backend returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Stream interrupted: {0}")]
    Stream(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl BackendError {
    /// Check if this error is an abort rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, BackendError::Cancelled)
    }
}

/// Lazy, finite, non-restartable sequence of fragments from one backend call.
///
/// The stream ends (`None`) when the backend closes its body. An `Err` item
/// is terminal: callers stop polling after the first one.
pub type FragmentStream = BoxStream<'static, Result<Fragment, BackendError>>;

/// One generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub session_id: SessionId,
    pub prompt: Prompt,
}

impl GenerationRequest {
    pub fn new(session_id: SessionId, prompt: Prompt) -> Self {
        Self { session_id, prompt }
    }
}

/// Backend that produces text incrementally.
///
/// Implementations live in the infrastructure layer. They decode the wire
/// format themselves: undecodable records are logged and skipped and never
/// reach the caller.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Open one streaming call.
    ///
    /// `cancellation` must not already be triggered; if it is, implementations
    /// return [`BackendError::Cancelled`] without contacting the backend.
    /// Triggering it later aborts the underlying network call and the stream
    /// yields [`BackendError::Cancelled`].
    async fn generate(
        &self,
        request: GenerationRequest,
        cancellation: CancellationToken,
    ) -> Result<FragmentStream, BackendError>;
}
