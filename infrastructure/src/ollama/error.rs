//! Error types for the Ollama adapter

use chatrelay_application::BackendError;
use thiserror::Error;
use tokio_util::codec::AnyDelimiterCodecError;

/// Errors that can occur when talking to an Ollama-compatible server
#[derive(Error, Debug)]
pub enum OllamaError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Ollama returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Stream read failed: {0}")]
    Read(#[from] AnyDelimiterCodecError),

    #[error("Ollama reported an error: {0}")]
    Remote(String),

    #[error("Failed to decode record: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<OllamaError> for BackendError {
    fn from(err: OllamaError) -> Self {
        match err {
            OllamaError::Http(e) if e.is_builder() => BackendError::InvalidRequest(e.to_string()),
            OllamaError::Http(e) if e.is_connect() || e.is_timeout() || e.is_request() => {
                BackendError::Connection(e.to_string())
            }
            OllamaError::Http(e) => BackendError::Stream(e.to_string()),
            OllamaError::Status { status, body } => BackendError::Status {
                status,
                message: body,
            },
            OllamaError::Read(e) => BackendError::Stream(e.to_string()),
            OllamaError::Remote(message) => BackendError::Stream(message),
            OllamaError::Decode(e) => BackendError::Stream(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_maps_to_backend_status() {
        let err: BackendError = OllamaError::Status {
            status: 404,
            body: "model not found".to_string(),
        }
        .into();
        assert!(matches!(err, BackendError::Status { status: 404, .. }));
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_remote_error_is_stream_failure() {
        let err: BackendError = OllamaError::Remote("out of memory".to_string()).into();
        assert!(matches!(err, BackendError::Stream(ref m) if m == "out of memory"));
    }
}
