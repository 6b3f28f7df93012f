//! Console sink for the `ask` command

use async_trait::async_trait;
use chatrelay_application::{OutputSink, SinkError};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// [`OutputSink`] that writes each fragment to a terminal and flushes it,
/// so text appears as soon as it is generated.
pub struct ConsoleSink<W = tokio::io::Stdout> {
    out: W,
}

impl ConsoleSink {
    pub fn stdout() -> Self {
        Self {
            out: tokio::io::stdout(),
        }
    }
}

impl<W> ConsoleSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[async_trait]
impl<W> OutputSink for ConsoleSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn write(&mut self, text: &str) -> Result<(), SinkError> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.flush().await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        // Markers carry no trailing newline; end the line for the shell prompt.
        self.out.write_all(b"\n").await?;
        self.out.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_writes_fragments_verbatim_then_newline_on_close() {
        let mut sink = ConsoleSink::new(Vec::new());
        sink.write("Hello").await.unwrap();
        sink.write(" world").await.unwrap();
        sink.write("\n[DONE]").await.unwrap();
        sink.close().await.unwrap();

        assert_eq!(sink.into_inner(), b"Hello world\n[DONE]\n");
    }
}
