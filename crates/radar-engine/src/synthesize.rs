use std::cmp::Ordering;
use std::collections::BTreeSet;

use radar_core::config::{ConfidenceConfig, RadarConfig};
use radar_core::history::HistorySnapshot;
use radar_core::model::{mean, Confidence, Direction, Narrative, ScoredSignal, SignalSource};

use crate::cluster::{IdeaDraft, NarrativeCandidate};

/// How many top members a templated explanation cites.
const EXPLANATION_CITES: usize = 3;

/// A synthesized narrative and the backend's idea drafts for it, if any.
#[derive(Debug, Clone)]
pub struct Synthesized {
    pub narrative: Narrative,
    pub idea_drafts: Vec<IdeaDraft>,
}

/// Derives confidence, direction and explanation for each candidate.
pub struct Synthesizer<'a> {
    config: &'a RadarConfig,
    history: &'a HistorySnapshot,
}

impl<'a> Synthesizer<'a> {
    pub fn new(config: &'a RadarConfig, history: &'a HistorySnapshot) -> Self {
        Self { config, history }
    }

    /// Synthesize and rank. Empty candidates are skipped.
    pub fn synthesize(&self, candidates: Vec<NarrativeCandidate>) -> Vec<Synthesized> {
        let mut out: Vec<Synthesized> = candidates
            .into_iter()
            .filter(|c| !c.members.is_empty())
            .map(|c| self.synthesize_one(c))
            .collect();
        out.sort_by(|a, b| rank(&a.narrative, &b.narrative));
        out
    }

    fn synthesize_one(&self, candidate: NarrativeCandidate) -> Synthesized {
        let NarrativeCandidate {
            name,
            members,
            explanation,
            ideas,
        } = candidate;

        let topics: BTreeSet<String> = members
            .iter()
            .flat_map(|m| m.signal.topics.iter().cloned())
            .collect();
        let aggregate_score = mean(members.iter().map(|m| m.score));
        let aggregate_velocity = mean(members.iter().map(|m| m.factors.velocity));
        let sources: BTreeSet<SignalSource> = members.iter().map(|m| m.signal.source).collect();

        let confidence = confidence(
            aggregate_score,
            members.len(),
            sources.len(),
            &self.config.confidence,
        );
        let direction = self.direction(&name, &topics, aggregate_velocity);
        let explanation = explanation.unwrap_or_else(|| template_explanation(&members, &sources));

        tracing::debug!(
            "Narrative {name:?}: {} members, avg {aggregate_score:.1}, {confidence}, {direction}",
            members.len()
        );

        Synthesized {
            narrative: Narrative {
                name,
                topics,
                member_signals: members,
                confidence,
                direction,
                explanation,
                aggregate_score,
                aggregate_velocity,
                ideas: Vec::new(),
            },
            idea_drafts: ideas,
        }
    }

    fn direction(&self, name: &str, topics: &BTreeSet<String>, velocity: f64) -> Direction {
        let window = self.config.history.window;
        match self.history.find_equivalent(name, topics, window) {
            None => Direction::Emerging,
            Some(previous) => {
                if velocity - previous.mean_velocity > self.config.history.flat_tolerance {
                    Direction::Accelerating
                } else {
                    Direction::Stabilizing
                }
            }
        }
    }
}

/// Table-driven confidence.
///
/// HIGH needs the high score cutoff, enough members and enough distinct
/// sources together. MEDIUM needs either the medium cutoff or enough sources.
pub fn confidence(
    avg_score: f64,
    members: usize,
    sources: usize,
    cfg: &ConfidenceConfig,
) -> Confidence {
    if avg_score >= cfg.high_min_score
        && members >= cfg.high_min_members
        && sources >= cfg.high_min_sources
    {
        Confidence::High
    } else if avg_score >= cfg.medium_min_score || sources >= cfg.medium_min_sources {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

/// Confidence descending, aggregate score descending, name ascending.
pub fn rank(a: &Narrative, b: &Narrative) -> Ordering {
    b.confidence
        .cmp(&a.confidence)
        .then_with(|| b.aggregate_score.total_cmp(&a.aggregate_score))
        .then_with(|| a.name.cmp(&b.name))
}

fn template_explanation(members: &[ScoredSignal], sources: &BTreeSet<SignalSource>) -> String {
    let mut top: Vec<&ScoredSignal> = members.iter().collect();
    top.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.signal.id.cmp(&b.signal.id))
    });
    let cited: Vec<String> = top
        .iter()
        .take(EXPLANATION_CITES)
        .map(|m| format!("{} ({}, {:.1})", m.signal.subject, m.signal.source, m.score))
        .collect();
    let source_list: Vec<&str> = sources.iter().map(SignalSource::as_str).collect();

    format!(
        "{} signal{} from {} source{} ({}). Strongest: {}.",
        members.len(),
        if members.len() == 1 { "" } else { "s" },
        sources.len(),
        if sources.len() == 1 { "" } else { "s" },
        source_list.join(", "),
        cited.join("; ")
    )
}
