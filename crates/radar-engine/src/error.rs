use std::time::Duration;

use thiserror::Error;

/// Why a clustering strategy could not produce narratives.
/// The pipeline absorbs all of these by falling back to rule-based clustering.
#[derive(Error, Debug)]
pub enum ClusteringError {
    #[error("LLM backend unavailable: {0}")]
    Unavailable(String),

    #[error("LLM call timed out after {0:?}")]
    Timeout(Duration),

    #[error("LLM transport error: {0}")]
    Transport(String),

    #[error("Malformed LLM response: {0}")]
    Malformed(String),

    #[error("LLM response references unknown signal {0}")]
    UnknownSignal(String),

    #[error("LLM response assigns signal {0} to more than one narrative")]
    DuplicateAssignment(String),

    #[error("Batch of {size} signals exceeds the LLM limit of {limit}")]
    BatchTooLarge { size: usize, limit: usize },
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("No usable input: all {0} raw records were rejected")]
    NoUsableInput(usize),

    #[error("Core error: {0}")]
    Core(#[from] radar_core::CoreError),
}
