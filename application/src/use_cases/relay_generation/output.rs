//! Output relay: fragments in, bytes out, one terminal marker last.

use crate::ports::output_sink::{OutputSink, SinkError};
use chatrelay_domain::{Fragment, TerminalMarkers, TerminalReason};
use tracing::{debug, warn};

/// Delivers fragments to one client sink in arrival order.
///
/// Each fragment is written on its own, never merged with its neighbours.
/// [`finish`](OutputRelay::finish) consumes the relay, so a terminal marker
/// is written at most once and nothing can be emitted after it.
///
/// When the sink fails (typically because the client went away) the relay
/// detaches: later emits are dropped silently while the generation keeps
/// running, so the full reply can still be persisted.
pub struct OutputRelay {
    sink: Box<dyn OutputSink>,
    markers: TerminalMarkers,
    detached: bool,
    emitted: usize,
}

impl OutputRelay {
    pub fn new(sink: Box<dyn OutputSink>, markers: TerminalMarkers) -> Self {
        Self {
            sink,
            markers,
            detached: false,
            emitted: 0,
        }
    }

    /// Write one fragment to the client as soon as it arrives.
    pub async fn emit(&mut self, fragment: &Fragment) {
        if self.detached {
            return;
        }
        match self.sink.write(fragment.as_str()).await {
            Ok(()) => self.emitted += 1,
            Err(e) => self.detach(&e),
        }
    }

    /// Write the marker for `reason` and close the sink.
    pub async fn finish(mut self, reason: TerminalReason) {
        if !self.detached {
            let marker = self.markers.marker(reason).to_string();
            if let Err(e) = self.sink.write(&marker).await {
                self.detach(&e);
            }
        }
        // Close even when detached so the transport can release the connection.
        if let Err(e) = self.sink.close().await {
            debug!("Closing client sink failed: {}", e);
        }
    }

    /// Whether the client sink has failed.
    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// Fragments successfully written so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    fn detach(&mut self, error: &SinkError) {
        match error {
            SinkError::Disconnected => debug!("Client disconnected; relay detached"),
            other => warn!("Client sink failed, relay detached: {}", other),
        }
        self.detached = true;
    }
}
