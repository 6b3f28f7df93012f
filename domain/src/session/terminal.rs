//! Terminal reasons and the markers that make them visible to clients.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Why a generation stopped.
///
/// Exactly one reason is settled per generation. Cancellation is a normal
/// outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminalReason {
    /// The backend closed its stream normally.
    Completed,
    /// A stop request removed the session before the stream finished.
    Cancelled,
    /// The backend or the network failed mid-stream.
    Failed,
}

impl TerminalReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminalReason::Completed => "completed",
            TerminalReason::Cancelled => "cancelled",
            TerminalReason::Failed => "failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TerminalReason::Failed)
    }
}

impl std::fmt::Display for TerminalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Text written to the client sink after the last fragment.
///
/// Each [`TerminalReason`] has its own marker. Markers are non-empty and
/// pairwise distinct so a client can tell the outcomes apart from the
/// byte stream alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMarkers", into = "RawMarkers")]
pub struct TerminalMarkers {
    completed: String,
    cancelled: String,
    failed: String,
}

#[derive(Serialize, Deserialize)]
struct RawMarkers {
    completed: String,
    cancelled: String,
    failed: String,
}

impl TerminalMarkers {
    pub const DEFAULT_COMPLETED: &'static str = "\n[DONE]";
    pub const DEFAULT_CANCELLED: &'static str = "\n[STOPPED]";
    pub const DEFAULT_FAILED: &'static str = "\n[ERROR: Failed to generate response]";

    pub fn new(
        completed: impl Into<String>,
        cancelled: impl Into<String>,
        failed: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let markers = Self {
            completed: completed.into(),
            cancelled: cancelled.into(),
            failed: failed.into(),
        };

        for (name, value) in [
            ("completed", &markers.completed),
            ("cancelled", &markers.cancelled),
            ("failed", &markers.failed),
        ] {
            if value.is_empty() {
                return Err(DomainError::AmbiguousMarkers(format!(
                    "{} marker is empty",
                    name
                )));
            }
        }

        if markers.completed == markers.cancelled
            || markers.completed == markers.failed
            || markers.cancelled == markers.failed
        {
            return Err(DomainError::AmbiguousMarkers(
                "two reasons share the same marker".to_string(),
            ));
        }

        Ok(markers)
    }

    /// Marker text for a terminal reason.
    pub fn marker(&self, reason: TerminalReason) -> &str {
        match reason {
            TerminalReason::Completed => &self.completed,
            TerminalReason::Cancelled => &self.cancelled,
            TerminalReason::Failed => &self.failed,
        }
    }

    /// Recover the reason from text that ends with one of the markers.
    ///
    /// Longest marker wins when one marker is a suffix of another.
    pub fn reason_of(&self, body: &str) -> Option<TerminalReason> {
        let mut candidates = [
            TerminalReason::Completed,
            TerminalReason::Cancelled,
            TerminalReason::Failed,
        ];
        candidates.sort_by_key(|r| std::cmp::Reverse(self.marker(*r).len()));
        candidates
            .into_iter()
            .find(|r| body.ends_with(self.marker(*r)))
    }
}

impl Default for TerminalMarkers {
    fn default() -> Self {
        Self {
            completed: Self::DEFAULT_COMPLETED.to_string(),
            cancelled: Self::DEFAULT_CANCELLED.to_string(),
            failed: Self::DEFAULT_FAILED.to_string(),
        }
    }
}

impl TryFrom<RawMarkers> for TerminalMarkers {
    type Error = DomainError;

    fn try_from(raw: RawMarkers) -> Result<Self, Self::Error> {
        Self::new(raw.completed, raw.cancelled, raw.failed)
    }
}

impl From<TerminalMarkers> for RawMarkers {
    fn from(markers: TerminalMarkers) -> Self {
        Self {
            completed: markers.completed,
            cancelled: markers.cancelled,
            failed: markers.failed,
        }
    }
}
