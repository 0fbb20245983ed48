use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;

use radar_core::config::ClusteringConfig;
use radar_core::model::{ClusteringMethod, ScoredSignal, OTHER_NARRATIVE};
use radar_ingest::topics::topic_label;

use super::{NarrativeCandidate, NarrativeClusterer};
use crate::error::ClusteringError;

/// Groups signals by their dominant topic: the topic, among a signal's own,
/// that spans the most distinct subjects in the batch. Ties go to the
/// alphabetically first topic.
#[derive(Debug, Clone)]
pub struct RuleBasedClusterer {
    min_group_size: usize,
    max_narratives: usize,
}

impl RuleBasedClusterer {
    pub fn new(config: &ClusteringConfig) -> Self {
        Self {
            min_group_size: config.min_group_size.max(1),
            max_narratives: config.max_narratives.max(1),
        }
    }

    /// Deterministic partition. Non-empty input always yields at least one candidate.
    pub fn partition(&self, signals: &[ScoredSignal]) -> Vec<NarrativeCandidate> {
        let mut subjects_by_topic: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
        for s in signals {
            for topic in &s.signal.topics {
                subjects_by_topic
                    .entry(topic.as_str())
                    .or_default()
                    .insert(s.signal.subject_key());
            }
        }

        let mut groups: BTreeMap<&str, Vec<ScoredSignal>> = BTreeMap::new();
        let mut other: Vec<ScoredSignal> = Vec::new();
        for s in signals {
            // Highest spread wins; Reverse sends ties to the earlier name.
            let dominant = s
                .signal
                .topics
                .iter()
                .map(|t| {
                    let spread = subjects_by_topic.get(t.as_str()).map_or(0, BTreeSet::len);
                    (spread, std::cmp::Reverse(t.as_str()))
                })
                .max()
                .map(|(_, std::cmp::Reverse(t))| t);
            match dominant {
                Some(topic) => groups.entry(topic).or_default().push(s.clone()),
                None => other.push(s.clone()),
            }
        }

        let mut ranked: Vec<(&str, Vec<ScoredSignal>)> = Vec::new();
        for (topic, members) in groups {
            if members.len() >= self.min_group_size {
                ranked.push((topic, members));
            } else {
                other.extend(members);
            }
        }
        ranked.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(b.0)));
        if ranked.len() > self.max_narratives {
            for (_, members) in ranked.drain(self.max_narratives..) {
                other.extend(members);
            }
        }

        let mut candidates: Vec<NarrativeCandidate> = ranked
            .into_iter()
            .map(|(topic, members)| NarrativeCandidate::new(topic_label(topic), members))
            .collect();
        if !other.is_empty() {
            candidates.push(NarrativeCandidate::new(OTHER_NARRATIVE, other));
        }

        tracing::debug!("Rule-based clustering produced {} candidates", candidates.len());
        candidates
    }
}

#[async_trait]
impl NarrativeClusterer for RuleBasedClusterer {
    fn method(&self) -> ClusteringMethod {
        ClusteringMethod::RuleBased
    }

    async fn cluster(
        &self,
        signals: &[ScoredSignal],
    ) -> Result<Vec<NarrativeCandidate>, ClusteringError> {
        Ok(self.partition(signals))
    }
}
