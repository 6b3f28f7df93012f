//! Wire types for the Ollama `/api/generate` endpoint.
//!
//! The request is a single JSON object. The response body is NDJSON: one
//! self-contained record per line, each optionally carrying a piece of text
//! in `response` and ending with a record whose `done` is `true`.

use super::error::OllamaError;
use chatrelay_domain::Fragment;
use serde::{Deserialize, Serialize};

/// Request body for a streaming generation
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub options: &'a serde_json::Map<String, serde_json::Value>,
}

impl<'a> GenerateRequest<'a> {
    pub fn streaming(
        model: &'a str,
        prompt: &'a str,
        options: &'a serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            model,
            prompt,
            stream: true,
            options,
        }
    }
}

/// One NDJSON record of the response body
///
/// Unknown fields (`model`, `created_at`, timing statistics, `context`) are
/// ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateRecord {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// What one line of the body means to the stream
#[derive(Debug, PartialEq, Eq)]
pub enum LineEvent {
    /// Incremental text to forward
    Text(Fragment),
    /// The backend finished; no more text follows
    Done(Option<Fragment>),
    /// Nothing to forward (blank line, or a record without text)
    Skip,
}

/// Decode one raw line of the response body.
///
/// Malformed lines, invalid UTF-8 included, return `Err(OllamaError::Decode)`
/// and are the caller's to log and skip. A record carrying `error` returns
/// `Err(OllamaError::Remote)`.
pub fn decode_line(line: impl AsRef<[u8]>) -> Result<LineEvent, OllamaError> {
    let line = line.as_ref().trim_ascii();
    if line.is_empty() {
        return Ok(LineEvent::Skip);
    }

    let record: GenerateRecord = serde_json::from_slice(line)?;
    if let Some(message) = record.error {
        return Err(OllamaError::Remote(message));
    }

    let fragment = record.response.and_then(Fragment::new);
    Ok(match (fragment, record.done) {
        (fragment, true) => LineEvent::Done(fragment),
        (Some(fragment), false) => LineEvent::Text(fragment),
        (None, false) => LineEvent::Skip,
    })
}
