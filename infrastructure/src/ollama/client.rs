//! Streaming client for Ollama's `/api/generate`.

use super::error::OllamaError;
use super::protocol::{GenerateRequest, LineEvent, decode_line};
use async_trait::async_trait;
use chatrelay_application::{BackendError, FragmentStream, GenerationBackend, GenerationRequest};
use chatrelay_domain::util::{log_preview, truncate_str};
use chatrelay_domain::{Fragment, SessionId};
use futures::stream::{self, Stream, StreamExt};
use std::time::Duration;
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, FramedRead};
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Longest line accepted from the response body (1 MiB)
const MAX_LINE_BYTES: usize = 1024 * 1024;

/// How much of an error body or malformed line ends up in the logs
const PREVIEW_BYTES: usize = 200;

/// Connection settings for [`OllamaBackend`]
#[derive(Debug, Clone)]
pub struct OllamaSettings {
    /// Full URL of the generate endpoint
    pub url: String,
    pub model: String,
    /// Passed through to the request's `options` field untouched
    pub options: serde_json::Map<String, serde_json::Value>,
    pub connect_timeout: Duration,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434/api/generate".to_string(),
            model: "gemma3:1b".to_string(),
            options: serde_json::Map::new(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// [`GenerationBackend`] backed by an Ollama-compatible HTTP server.
///
/// One POST per generation. The chunked NDJSON body is split into lines as
/// bytes arrive and each line is decoded on its own; a line that fails to
/// decode is logged and skipped.
pub struct OllamaBackend {
    http: reqwest::Client,
    settings: OllamaSettings,
}

impl OllamaBackend {
    pub fn new(settings: OllamaSettings) -> Result<Self, OllamaError> {
        // No overall request timeout: a generation may legitimately run for minutes.
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()?;
        Ok(Self { http, settings })
    }

    pub fn settings(&self) -> &OllamaSettings {
        &self.settings
    }
}

#[async_trait]
impl GenerationBackend for OllamaBackend {
    async fn generate(
        &self,
        request: GenerationRequest,
        cancellation: CancellationToken,
    ) -> Result<FragmentStream, BackendError> {
        if cancellation.is_cancelled() {
            return Err(BackendError::Cancelled);
        }

        let body = GenerateRequest::streaming(
            &self.settings.model,
            request.prompt.content(),
            &self.settings.options,
        );
        debug!(
            session_id = %request.session_id,
            url = %self.settings.url,
            model = %self.settings.model,
            "Opening generate stream"
        );

        let send = self.http.post(&self.settings.url).json(&body).send();
        let response = tokio::select! {
            biased;
            _ = cancellation.cancelled() => return Err(BackendError::Cancelled),
            response = send => response.map_err(OllamaError::from)?,
        };

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(OllamaError::Status {
                status: status.as_u16(),
                body: truncate_str(text.trim(), PREVIEW_BYTES).to_string(),
            }
            .into());
        }

        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(std::io::Error::other));
        let lines = FramedRead::new(StreamReader::new(bytes), line_codec());

        Ok(decode_fragments(
            Box::pin(lines),
            cancellation,
            request.session_id,
        ))
    }
}

/// Splits the body on `\n` without interpreting the bytes, so a line that is
/// not valid UTF-8 reaches the decoder and is skipped like any other
/// malformed record.
fn line_codec() -> AnyDelimiterCodec {
    AnyDelimiterCodec::new_with_max_length(b"\n".to_vec(), Vec::new(), MAX_LINE_BYTES)
}

struct DecodeState<S> {
    lines: S,
    cancellation: CancellationToken,
    session_id: SessionId,
    finished: bool,
}

/// Turn a stream of body lines into a stream of fragments.
///
/// Ends after the `done` record or at end of body. A read error, an `error`
/// record, or cancellation yields one `Err` and ends the stream.
pub(crate) fn decode_fragments<S, B>(
    lines: S,
    cancellation: CancellationToken,
    session_id: SessionId,
) -> FragmentStream
where
    S: Stream<Item = Result<B, AnyDelimiterCodecError>> + Unpin + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let state = DecodeState {
        lines,
        cancellation,
        session_id,
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        if state.finished {
            return None;
        }
        loop {
            let next = tokio::select! {
                biased;
                _ = state.cancellation.cancelled() => None,
                next = state.lines.next() => Some(next),
            };
            let Some(next) = next else {
                state.finished = true;
                return Some((Err(BackendError::Cancelled), state));
            };

            let line = match next {
                None => return None,
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(OllamaError::from(e).into()), state));
                }
            };

            match decode_line(&line) {
                Ok(LineEvent::Text(fragment)) => return Some((Ok(fragment), state)),
                Ok(LineEvent::Done(last)) => {
                    state.finished = true;
                    return last.map(|fragment: Fragment| (Ok(fragment), state));
                }
                Ok(LineEvent::Skip) => continue,
                Err(OllamaError::Decode(e)) => {
                    warn!(
                        session_id = %state.session_id,
                        "Dropping undecodable line ({}): {}",
                        e,
                        log_preview(&String::from_utf8_lossy(line.as_ref()), PREVIEW_BYTES)
                    );
                }
                Err(e) => {
                    state.finished = true;
                    return Some((Err(e.into()), state));
                }
            }
        }
    })
    .boxed()
}
