//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod relay_generation;
pub mod stop_generation;
