//! Session value objects: identifiers and prompts.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Maximum accepted length of a session id, in bytes.
pub const MAX_SESSION_ID_LEN: usize = 128;

/// Caller-supplied identifier of one conversation (Value Object).
///
/// The relay never generates these; it only uses them as registry keys
/// while a generation is streaming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Validate and wrap a session id.
    ///
    /// Rejects empty or whitespace-only ids, ids longer than
    /// [`MAX_SESSION_ID_LEN`], and ids containing control characters.
    pub fn parse(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::InvalidSessionId("id is empty".to_string()));
        }
        if id.len() > MAX_SESSION_ID_LEN {
            return Err(DomainError::InvalidSessionId(format!(
                "id exceeds {} bytes",
                MAX_SESSION_ID_LEN
            )));
        }
        if id.chars().any(char::is_control) {
            return Err(DomainError::InvalidSessionId(
                "id contains control characters".to_string(),
            ));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A non-empty prompt destined for the generation backend (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    content: String,
}

impl Prompt {
    /// Create a prompt, rejecting empty or whitespace-only content.
    ///
    /// The content is kept verbatim; surrounding whitespace is the
    /// caller's business.
    pub fn new(content: impl Into<String>) -> Result<Self, DomainError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(DomainError::EmptyPrompt);
        }
        Ok(Self { content })
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn into_content(self) -> String {
        self.content
    }
}

impl std::fmt::Display for Prompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_accepts_uuid() {
        let id = SessionId::parse("0b8f6c1e-2d4a-4c59-9a7e-3f1d2b6c8e90").unwrap();
        assert_eq!(id.as_str(), "0b8f6c1e-2d4a-4c59-9a7e-3f1d2b6c8e90");
    }

    #[test]
    fn test_session_id_rejects_blank() {
        assert!(SessionId::parse("").is_err());
        assert!(SessionId::parse("   ").is_err());
    }

    #[test]
    fn test_session_id_rejects_control_chars() {
        assert!(SessionId::parse("s1\n").is_err());
    }

    #[test]
    fn test_session_id_rejects_oversized() {
        let long = "x".repeat(MAX_SESSION_ID_LEN + 1);
        assert!(SessionId::parse(long).is_err());
        let max = "x".repeat(MAX_SESSION_ID_LEN);
        assert!(SessionId::parse(max).is_ok());
    }

    #[test]
    fn test_session_id_serde_validates() {
        let ok: SessionId = serde_json::from_str("\"s1\"").unwrap();
        assert_eq!(ok.as_str(), "s1");
        assert!(serde_json::from_str::<SessionId>("\"\"").is_err());
    }

    #[test]
    fn test_prompt_rejects_whitespace() {
        assert_eq!(Prompt::new("  \n").unwrap_err(), DomainError::EmptyPrompt);
    }

    #[test]
    fn test_prompt_keeps_content_verbatim() {
        let prompt = Prompt::new("  Hello ").unwrap();
        assert_eq!(prompt.content(), "  Hello ");
    }
}
