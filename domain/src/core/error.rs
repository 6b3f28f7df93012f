//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Prompt cannot be empty")]
    EmptyPrompt,

    #[error("Invalid session id: {0}")]
    InvalidSessionId(String),

    #[error("Terminal markers must be non-empty and distinct: {0}")]
    AmbiguousMarkers(String),
}

impl DomainError {
    /// Check if this error was caused by caller input rather than configuration
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            DomainError::EmptyPrompt | DomainError::InvalidSessionId(_)
        )
    }
}
