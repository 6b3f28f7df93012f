//! Relay state machine.
//!
//! ```text
//! Idle → Registering → Streaming → Finalizing(reason) → Done(reason)
//! ```
//!
//! Registration failure (`AlreadyActive`) ends the invocation while still
//! in `Registering`; it never reaches `Streaming`.

use super::terminal::TerminalReason;

/// Phase of one relay invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayPhase {
    Idle,
    Registering,
    Streaming,
    Finalizing(TerminalReason),
    Done(TerminalReason),
}

impl RelayPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayPhase::Idle => "idle",
            RelayPhase::Registering => "registering",
            RelayPhase::Streaming => "streaming",
            RelayPhase::Finalizing(_) => "finalizing",
            RelayPhase::Done(_) => "done",
        }
    }

    /// Whether `next` is a legal successor of this phase.
    ///
    /// The reason carried into `Done` must be the one settled on entering
    /// `Finalizing`.
    pub fn can_transition_to(&self, next: &RelayPhase) -> bool {
        match (self, next) {
            (RelayPhase::Idle, RelayPhase::Registering) => true,
            (RelayPhase::Registering, RelayPhase::Streaming) => true,
            (RelayPhase::Streaming, RelayPhase::Finalizing(_)) => true,
            (RelayPhase::Finalizing(a), RelayPhase::Done(b)) => a == b,
            _ => false,
        }
    }

    /// The settled reason, once one exists.
    pub fn reason(&self) -> Option<TerminalReason> {
        match self {
            RelayPhase::Finalizing(r) | RelayPhase::Done(r) => Some(*r),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RelayPhase::Done(_))
    }
}

impl std::fmt::Display for RelayPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.reason() {
            Some(reason) => write!(f, "{}({})", self.as_str(), reason),
            None => write!(f, "{}", self.as_str()),
        }
    }
}
