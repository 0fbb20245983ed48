use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::idea::Idea;
use super::signal::{ScoredSignal, SignalSource};

/// Name of the catch-all narrative for signals that fit no theme.
pub const OTHER_NARRATIVE: &str = "Other";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Emerging,
    Accelerating,
    Stabilizing,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emerging => "EMERGING",
            Self::Accelerating => "ACCELERATING",
            Self::Stabilizing => "STABILIZING",
        }
    }

    /// Adjective used when templating idea names.
    pub fn adjective(&self) -> &'static str {
        match self {
            Self::Emerging => "early-mover",
            Self::Accelerating => "momentum",
            Self::Stabilizing => "consolidation",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A thematically coherent cluster of scored signals.
///
/// `member_signals` keeps clustering order. A signal appears in at most one
/// narrative per run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Narrative {
    pub name: String,
    pub topics: BTreeSet<String>,
    pub member_signals: Vec<ScoredSignal>,
    pub confidence: Confidence,
    pub direction: Direction,
    pub explanation: String,
    /// Mean composite score of the members.
    pub aggregate_score: f64,
    /// Mean velocity sub-score of the members.
    pub aggregate_velocity: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ideas: Vec<Idea>,
}

impl Narrative {
    pub fn sources(&self) -> BTreeSet<SignalSource> {
        self.member_signals.iter().map(|m| m.signal.source).collect()
    }

    pub fn subjects(&self) -> BTreeSet<String> {
        self.member_signals
            .iter()
            .map(|m| m.signal.subject_key())
            .collect()
    }

    /// Members sorted by score descending, ties by id.
    pub fn top_members(&self, n: usize) -> Vec<&ScoredSignal> {
        let mut members: Vec<&ScoredSignal> = self.member_signals.iter().collect();
        members.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.signal.id.cmp(&b.signal.id))
        });
        members.truncate(n);
        members
    }
}

/// Mean of an iterator of scores; 0 for an empty input.
pub fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_ordering() {
        assert!(Confidence::High > Confidence::Medium);
        assert!(Confidence::Medium > Confidence::Low);
    }

    #[test]
    fn test_confidence_serde() {
        let json = serde_json::to_string(&Confidence::High).unwrap();
        assert_eq!(json, "\"HIGH\"");
        let parsed: Direction = serde_json::from_str("\"ACCELERATING\"").unwrap();
        assert_eq!(parsed, Direction::Accelerating);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(Vec::<f64>::new()), 0.0);
        assert!((mean([80.0, 60.0]) - 70.0).abs() < 1e-9);
    }
}
