//! Streaming HTTP response body fed by a relay.

use async_trait::async_trait;
use axum::body::Body;
use chatrelay_application::{OutputSink, SinkError};
use futures::stream;
use std::convert::Infallible;
use tokio::sync::mpsc;

/// [`OutputSink`] that hands each write to a streaming response [`Body`].
///
/// The channel is bounded, so a slow client holds up the generation instead
/// of letting text pile up in memory. When the client goes away the body is
/// dropped and the next write reports [`SinkError::Disconnected`].
pub struct ChannelSink {
    tx: Option<mpsc::Sender<String>>,
}

/// Create a connected sink and response body.
///
/// `capacity` is the number of writes that may be buffered; it must be at
/// least 1.
pub fn channel_body(capacity: usize) -> (ChannelSink, Body) {
    let (tx, rx) = mpsc::channel::<String>(capacity.max(1));
    let chunks = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (Ok::<_, Infallible>(chunk), rx))
    });
    (ChannelSink { tx: Some(tx) }, Body::from_stream(chunks))
}

#[async_trait]
impl OutputSink for ChannelSink {
    async fn write(&mut self, text: &str) -> Result<(), SinkError> {
        let tx = self.tx.as_ref().ok_or(SinkError::Disconnected)?;
        tx.send(text.to_string())
            .await
            .map_err(|_| SinkError::Disconnected)
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        // Dropping the sender ends the body.
        self.tx.take();
        Ok(())
    }
}
