//! Application layer for chatrelay
//!
//! This crate contains the relay use cases, the session registry and the
//! port definitions. It depends only on the domain layer.

pub mod ports;
pub mod registry;
pub mod use_cases;

// Re-export commonly used types
pub use ports::{
    generation_backend::{BackendError, FragmentStream, GenerationBackend, GenerationRequest},
    output_sink::{OutputSink, SinkError},
    transcript_store::{NoTranscriptStore, StoreError, TranscriptStore},
};
pub use registry::{AlreadyActive, Registration, SessionRegistry, StopOutcome};
pub use use_cases::relay_generation::{
    OutputRelay, RelayError, RelayGeneration, RelayGenerationUseCase, RelayInput, RelayOutcome,
};
pub use use_cases::stop_generation::StopGenerationUseCase;
