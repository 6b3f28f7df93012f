//! Stop Generation use case.

use crate::registry::{SessionRegistry, StopOutcome};
use chatrelay_domain::SessionId;
use std::sync::Arc;
use tracing::info;

/// Requests cancellation of a session's active generation.
///
/// Stopping never waits for the generation to wind down: the stopped
/// generation writes its own `cancelled` marker and persists what it has.
#[derive(Clone)]
pub struct StopGenerationUseCase {
    registry: Arc<SessionRegistry>,
}

impl StopGenerationUseCase {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Stop one session. Idempotent: a second call returns `NotFound`.
    pub fn execute(&self, session_id: &SessionId) -> StopOutcome {
        let outcome = self.registry.cancel(session_id);
        match outcome {
            StopOutcome::Stopped => info!(session_id = %session_id, "Stop requested"),
            StopOutcome::NotFound => {
                info!(session_id = %session_id, "Stop requested but nothing is streaming")
            }
        }
        outcome
    }

    /// Stop every active session, e.g. on shutdown.
    pub fn stop_all(&self) -> usize {
        let stopped = self.registry.cancel_all();
        if stopped > 0 {
            info!("Stopped {} active generation(s)", stopped);
        }
        stopped
    }
}
