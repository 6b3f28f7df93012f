//! Shared state for HTTP handlers.

use chatrelay_application::{RelayGenerationUseCase, SessionRegistry, StopGenerationUseCase};
use std::sync::Arc;

/// Everything a handler needs; cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub relay: RelayGenerationUseCase,
    pub stop: StopGenerationUseCase,
    /// Writes buffered between a generation and its response body
    pub channel_capacity: usize,
}

impl AppState {
    pub fn new(relay: RelayGenerationUseCase, channel_capacity: usize) -> Self {
        let stop = StopGenerationUseCase::new(Arc::clone(relay.registry()));
        Self {
            relay,
            stop,
            channel_capacity,
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        self.relay.registry()
    }
}
