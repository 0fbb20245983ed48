//! Partitioning of passing signals into narrative candidates.
//!
//! Two interchangeable strategies sit behind [`NarrativeClusterer`]:
//! [`RuleBasedClusterer`] is deterministic and always available;
//! [`LlmClusterer`] delegates grouping to an [`LlmBackend`] and validates
//! the answer strictly. Any LLM failure means the pipeline re-runs the
//! whole batch through the rule-based strategy.

mod llm;
mod rule_based;

use async_trait::async_trait;

use radar_core::model::{ClusteringMethod, ScoredSignal};

use crate::error::ClusteringError;

pub use llm::{build_prompt, parse_response, LlmBackend, LlmClusterer, NarrativeHint};
pub use rule_based::RuleBasedClusterer;

/// An idea suggested by the clustering backend, before local enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct IdeaDraft {
    pub name: String,
    pub description: String,
    pub target_user: Option<String>,
}

/// A named group of signals awaiting synthesis.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeCandidate {
    pub name: String,
    /// Members in clustering order.
    pub members: Vec<ScoredSignal>,
    /// Why-now text supplied by the strategy, if any.
    pub explanation: Option<String>,
    pub ideas: Vec<IdeaDraft>,
}

impl NarrativeCandidate {
    pub fn new(name: impl Into<String>, members: Vec<ScoredSignal>) -> Self {
        Self {
            name: name.into(),
            members,
            explanation: None,
            ideas: Vec::new(),
        }
    }
}

#[async_trait]
pub trait NarrativeClusterer: Send + Sync {
    fn method(&self) -> ClusteringMethod;

    /// Partition `signals` so each lands in exactly one candidate.
    async fn cluster(
        &self,
        signals: &[ScoredSignal],
    ) -> Result<Vec<NarrativeCandidate>, ClusteringError>;
}
