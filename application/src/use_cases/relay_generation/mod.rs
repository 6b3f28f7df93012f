//! Relay Generation use case.
//!
//! Streams one backend generation to one client:
//!
//! 1. **Registering**: claim the session in the [`SessionRegistry`]; a
//!    session that is already streaming is rejected with [`AlreadyActive`]
//!    before the backend is contacted
//! 2. **Streaming**: forward every fragment through the [`OutputRelay`] and
//!    into the [`Transcript`]
//! 3. **Finalizing**: settle the terminal reason, release the registry
//!    entry, persist the transcript
//! 4. **Done**: write the terminal marker and close the sink
//!
//! [`RelayGenerationUseCase::start`] performs step 1 synchronously so callers
//! can report `AlreadyActive` before committing to a streaming response; the
//! returned [`RelayGeneration`] runs the rest.

mod output;

pub use output::OutputRelay;

use crate::ports::generation_backend::{BackendError, GenerationBackend, GenerationRequest};
use crate::ports::output_sink::OutputSink;
use crate::ports::transcript_store::{NoTranscriptStore, TranscriptStore};
use crate::registry::{AlreadyActive, Registration, SessionRegistry};
use chatrelay_domain::util::truncate_str;
use chatrelay_domain::{
    DomainError, Prompt, RelayPhase, SessionId, TerminalMarkers, TerminalReason, Transcript,
};
use futures::StreamExt;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

/// Errors that reject a start request.
///
/// Once a generation is running it never fails: backend errors surface as
/// the `failed` terminal marker instead.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error(transparent)]
    AlreadyActive(#[from] AlreadyActive),

    #[error("Invalid input: {0}")]
    InvalidInput(#[from] DomainError),
}

/// Input for [`RelayGenerationUseCase::start`].
#[derive(Debug, Clone)]
pub struct RelayInput {
    pub session_id: SessionId,
    pub prompt: String,
}

impl RelayInput {
    pub fn new(session_id: SessionId, prompt: impl Into<String>) -> Self {
        Self {
            session_id,
            prompt: prompt.into(),
        }
    }
}

/// What a finished generation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOutcome {
    pub session_id: SessionId,
    pub reason: TerminalReason,
    /// Accumulated reply, as handed to the transcript store.
    pub text: String,
    pub fragments: usize,
    /// Whether the transcript store accepted the reply.
    pub persisted: bool,
    /// Whether the client sink failed before the end of the stream.
    pub client_detached: bool,
}

/// Use case that relays backend output to clients.
///
/// Cheap to clone; every clone shares the same registry.
#[derive(Clone)]
pub struct RelayGenerationUseCase {
    backend: Arc<dyn GenerationBackend>,
    registry: Arc<SessionRegistry>,
    store: Arc<dyn TranscriptStore>,
    markers: TerminalMarkers,
}

impl RelayGenerationUseCase {
    pub fn new(backend: Arc<dyn GenerationBackend>, registry: Arc<SessionRegistry>) -> Self {
        Self {
            backend,
            registry,
            store: Arc::new(NoTranscriptStore),
            markers: TerminalMarkers::default(),
        }
    }

    /// Create with a transcript store.
    pub fn with_transcript_store(mut self, store: Arc<dyn TranscriptStore>) -> Self {
        self.store = store;
        self
    }

    /// Create with custom terminal markers.
    pub fn with_markers(mut self, markers: TerminalMarkers) -> Self {
        self.markers = markers;
        self
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn markers(&self) -> &TerminalMarkers {
        &self.markers
    }

    /// Validate the input and claim the session.
    ///
    /// Fails with [`RelayError::AlreadyActive`] if the session is streaming
    /// already; no backend call is made in that case.
    pub fn start(&self, input: RelayInput) -> Result<RelayGeneration, RelayError> {
        let prompt = Prompt::new(input.prompt)?;
        let registration = self
            .registry
            .register(input.session_id, CancellationToken::new())?;

        info!(
            session_id = %registration.session_id(),
            generation = registration.generation(),
            "Starting generation: {}",
            truncate_str(prompt.content(), 100)
        );

        Ok(RelayGeneration {
            registration,
            prompt,
            backend: Arc::clone(&self.backend),
            store: Arc::clone(&self.store),
            markers: self.markers.clone(),
            phase: RelayPhase::Registering,
        })
    }

    /// Start and run a generation to its end.
    pub async fn execute(
        &self,
        input: RelayInput,
        sink: Box<dyn OutputSink>,
    ) -> Result<RelayOutcome, RelayError> {
        let generation = self.start(input)?;
        Ok(generation.run(sink).await)
    }
}

/// A registered generation that has not started streaming yet.
///
/// Dropping it without calling [`run`](RelayGeneration::run) releases the
/// session.
pub struct RelayGeneration {
    registration: Registration,
    prompt: Prompt,
    backend: Arc<dyn GenerationBackend>,
    store: Arc<dyn TranscriptStore>,
    markers: TerminalMarkers,
    phase: RelayPhase,
}

impl RelayGeneration {
    pub fn session_id(&self) -> &SessionId {
        self.registration.session_id()
    }

    /// Token that a stop request for this generation triggers.
    pub fn cancellation_token(&self) -> &CancellationToken {
        self.registration.token()
    }

    /// Stream to `sink` until the backend finishes, fails, or a stop request
    /// arrives. Always ends with exactly one terminal marker.
    pub async fn run(mut self, sink: Box<dyn OutputSink>) -> RelayOutcome {
        let session_id = self.registration.session_id().clone();
        let mut relay = OutputRelay::new(sink, self.markers.clone());
        let mut transcript = Transcript::new();

        if let Err(e) = self.store.record_prompt(&session_id, &self.prompt).await {
            error!(session_id = %session_id, "Failed to record prompt: {}", e);
        }

        self.advance(RelayPhase::Streaming);
        let observed = self.stream(&mut relay, &mut transcript).await;

        // A stop request removes the entry before triggering the token. If
        // it got there first, the generation counts as cancelled whatever the
        // stream itself reported.
        let RelayGeneration {
            registration,
            store,
            mut phase,
            ..
        } = self;
        // Released before persisting so a slow store never blocks a restart.
        let removed_by_us = registration.release();
        let reason = if removed_by_us {
            observed
        } else {
            TerminalReason::Cancelled
        };
        advance_phase(&mut phase, RelayPhase::Finalizing(reason), &session_id);

        let persisted = match store
            .record_reply(&session_id, transcript.as_str(), reason)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                error!(session_id = %session_id, reason = %reason, "Failed to record reply: {}", e);
                false
            }
        };

        let client_detached = relay.is_detached();
        relay.finish(reason).await;
        advance_phase(&mut phase, RelayPhase::Done(reason), &session_id);

        info!(
            session_id = %session_id,
            reason = %reason,
            fragments = transcript.fragment_count(),
            bytes = transcript.as_str().len(),
            "Generation finished"
        );

        RelayOutcome {
            session_id,
            reason,
            fragments: transcript.fragment_count(),
            text: transcript.into_text(),
            persisted,
            client_detached,
        }
    }

    async fn stream(&self, relay: &mut OutputRelay, transcript: &mut Transcript) -> TerminalReason {
        let token = self.registration.token().clone();
        let session_id = self.registration.session_id();
        let request = GenerationRequest::new(session_id.clone(), self.prompt.clone());

        let opened = tokio::select! {
            biased;
            _ = token.cancelled() => return TerminalReason::Cancelled,
            opened = self.backend.generate(request, token.clone()) => opened,
        };

        let mut fragments = match opened {
            Ok(stream) => stream,
            Err(e) => return classify(session_id, &e),
        };

        loop {
            // Dropping the stream on cancellation aborts the backend call
            // even if the backend does not watch the token itself.
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => return TerminalReason::Cancelled,
                next = fragments.next() => next,
            };

            match next {
                Some(Ok(fragment)) => {
                    trace!(session_id = %session_id, bytes = fragment.len(), "Fragment");
                    transcript.push(&fragment);
                    // A client that stops reading must not keep the backend
                    // call open past a stop request.
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => return TerminalReason::Cancelled,
                        _ = relay.emit(&fragment) => {}
                    }
                }
                Some(Err(e)) => return classify(session_id, &e),
                None => return TerminalReason::Completed,
            }
        }
    }

    fn advance(&mut self, next: RelayPhase) {
        let session_id = self.registration.session_id().clone();
        advance_phase(&mut self.phase, next, &session_id);
    }
}

fn advance_phase(phase: &mut RelayPhase, next: RelayPhase, session_id: &SessionId) {
    debug_assert!(
        phase.can_transition_to(&next),
        "illegal relay transition {} -> {}",
        phase,
        next
    );
    debug!(session_id = %session_id, "Relay phase: {} -> {}", phase, next);
    *phase = next;
}

fn classify(session_id: &SessionId, error: &BackendError) -> TerminalReason {
    if error.is_cancelled() {
        debug!(session_id = %session_id, "Backend stream aborted");
        TerminalReason::Cancelled
    } else {
        warn!(session_id = %session_id, "Backend stream failed: {}", error);
        TerminalReason::Failed
    }
}
