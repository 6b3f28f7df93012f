//! Client-facing output port.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from writing to a client sink
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Client disconnected")]
    Disconnected,

    #[error("Write failed: {0}")]
    Io(String),
}

impl From<std::io::Error> for SinkError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::ConnectionReset => {
                SinkError::Disconnected
            }
            _ => SinkError::Io(err.to_string()),
        }
    }
}

/// An open, ordered byte channel to one client.
///
/// Bytes written are delivered in order until [`close`](OutputSink::close).
/// `write` may suspend while the client is slow; that backpressure is the
/// only flow control the relay applies.
#[async_trait]
pub trait OutputSink: Send {
    /// Write text to the client and push it out immediately.
    async fn write(&mut self, text: &str) -> Result<(), SinkError>;

    /// Close the channel. No writes follow.
    async fn close(&mut self) -> Result<(), SinkError>;
}
