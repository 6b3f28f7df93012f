//! Domain layer for chatrelay
//!
//! This crate contains the core value objects of the streaming relay.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! - **Session**: a caller-supplied id that is "active" only while a
//!   generation for it is streaming
//! - **Fragment**: one non-empty piece of incremental text from the backend
//! - **Transcript**: every fragment of one generation, in arrival order
//! - **Terminal reason**: `completed`, `cancelled` or `failed`, each with its
//!   own client-visible marker

pub mod core;
pub mod session;
pub mod util;

// Re-export commonly used types
pub use crate::core::error::DomainError;
pub use session::{
    fragment::{Fragment, Transcript},
    phase::RelayPhase,
    terminal::{TerminalMarkers, TerminalReason},
    title::{TITLE_MAX_CHARS, derive_title},
    value_objects::{MAX_SESSION_ID_LEN, Prompt, SessionId},
};
