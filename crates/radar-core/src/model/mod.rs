pub mod idea;
pub mod narrative;
pub mod report;
pub mod signal;

pub use idea::{Complexity, Idea};
pub use narrative::{mean, Confidence, Direction, Narrative, OTHER_NARRATIVE};
pub use report::{ClusteringMethod, FadedNarrative, Report, SignalSummary};
pub use signal::{subject_key, FactorScores, ScoredSignal, Signal, SignalId, SignalSource};
