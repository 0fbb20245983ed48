//! Signal scoring and narrative clustering.
//!
//! [`Engine::run`] takes a raw batch and a read-only history snapshot and
//! returns a ranked [`radar_core::model::Report`]. Each stage is also usable
//! on its own.

pub mod cluster;
pub mod error;
pub mod gate;
pub mod ideas;
pub mod pipeline;
pub mod report;
pub mod score;
pub mod synthesize;

#[cfg(test)]
mod testing;

pub use cluster::{
    IdeaDraft, LlmBackend, LlmClusterer, NarrativeCandidate, NarrativeClusterer, NarrativeHint,
    RuleBasedClusterer,
};
pub use error::{ClusteringError, EngineError};
pub use pipeline::{Engine, Narration, RecordedRun};
pub use score::Scorer;
