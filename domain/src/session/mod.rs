//! Generation session domain.
//!
//! - [`value_objects::SessionId`] / [`value_objects::Prompt`]: validated inputs
//! - [`fragment::Fragment`] / [`fragment::Transcript`]: streamed text and its accumulator
//! - [`terminal::TerminalReason`] / [`terminal::TerminalMarkers`]: how a generation ended
//! - [`phase::RelayPhase`]: relay state machine
//! - [`title::derive_title`]: conversation title from the first prompt

pub mod fragment;
pub mod phase;
pub mod terminal;
pub mod title;
pub mod value_objects;
