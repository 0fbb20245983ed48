use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{
    subject_key, Confidence, FadedNarrative, Narrative, Report, Signal, SignalSource,
    OTHER_NARRATIVE,
};

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "on", "in", "of", "a", "an", "to", "is", "protocol",
    "ecosystem", "network", "based", "powered",
];

/// Word overlap at or above this ratio makes two narrative names equivalent.
const NAME_MATCH_RATIO: f64 = 0.5;

/// What one past run reported about a narrative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NarrativeRecord {
    pub name: String,
    pub canonical_name: String,
    #[serde(default)]
    pub topics: BTreeSet<String>,
    #[serde(default)]
    pub subjects: BTreeSet<String>,
    pub mean_velocity: f64,
    pub confidence: Confidence,
}

/// Last observed magnitude of a (source, subject) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BaselineRecord {
    pub source: SignalSource,
    pub subject: String,
    pub magnitude: f64,
    pub observed_at: DateTime<Utc>,
}

/// Everything the engine needs to remember about one completed run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub run_at: DateTime<Utc>,
    #[serde(default)]
    pub narratives: Vec<NarrativeRecord>,
    #[serde(default)]
    pub baselines: Vec<BaselineRecord>,
}

impl RunRecord {
    /// Derive the history entry for a finished run.
    ///
    /// Baselines cover every normalized signal of the batch, including those
    /// the gate dropped. When a (source, subject) pair appears more than once
    /// the latest observation wins.
    pub fn from_run(report: &Report, observed: &[Signal]) -> Self {
        let narratives = report
            .narratives
            .iter()
            .map(|n| NarrativeRecord {
                name: n.name.clone(),
                canonical_name: canonical_name(&n.name),
                topics: n.topics.clone(),
                subjects: n.subjects(),
                mean_velocity: n.aggregate_velocity,
                confidence: n.confidence,
            })
            .collect();

        let mut baselines: Vec<BaselineRecord> = Vec::new();
        for signal in observed {
            let key = signal.subject_key();
            match baselines
                .iter_mut()
                .find(|b| b.source == signal.source && b.subject == key)
            {
                Some(existing) if existing.observed_at <= signal.observed_at => {
                    existing.magnitude = signal.magnitude;
                    existing.observed_at = signal.observed_at;
                }
                Some(_) => {}
                None => baselines.push(BaselineRecord {
                    source: signal.source,
                    subject: key,
                    magnitude: signal.magnitude,
                    observed_at: signal.observed_at,
                }),
            }
        }

        Self {
            run_id: report.run_id,
            run_at: report.generated_at,
            narratives,
            baselines,
        }
    }
}

/// Read-only view of recent runs, oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HistorySnapshot {
    #[serde(default)]
    pub runs: Vec<RunRecord>,
}

impl HistorySnapshot {
    pub fn new(runs: Vec<RunRecord>) -> Self {
        Self { runs }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// The `n` most recent runs, oldest first.
    pub fn window(&self, n: usize) -> &[RunRecord] {
        let start = self.runs.len().saturating_sub(n);
        &self.runs[start..]
    }

    /// Named narratives reported in the window with the last run that saw
    /// them, most recent first. The catch-all is left out.
    pub fn recent_names(&self, window: usize) -> Vec<(String, DateTime<Utc>)> {
        let mut seen = BTreeSet::new();
        let mut names = Vec::new();
        for run in self.window(window).iter().rev() {
            for n in &run.narratives {
                if n.name.eq_ignore_ascii_case(OTHER_NARRATIVE) {
                    continue;
                }
                if seen.insert(n.canonical_name.clone()) {
                    names.push((n.name.clone(), run.run_at));
                }
            }
        }
        names
    }

    /// Most recent baseline for a (source, subject) pair within the window.
    pub fn baseline(
        &self,
        source: SignalSource,
        subject: &str,
        window: usize,
    ) -> Option<&BaselineRecord> {
        let key = subject_key(subject);
        self.window(window)
            .iter()
            .rev()
            .flat_map(|run| run.baselines.iter())
            .find(|b| b.source == source && b.subject == key)
    }

    /// Runs in the window that surfaced this subject in any narrative.
    pub fn subject_runs(&self, subject: &str, window: usize) -> usize {
        let key = subject_key(subject);
        self.window(window)
            .iter()
            .filter(|run| run.narratives.iter().any(|n| n.subjects.contains(&key)))
            .count()
    }

    /// Runs in the window that surfaced one of `topics` but not the subject.
    pub fn topic_only_runs(
        &self,
        subject: &str,
        topics: &BTreeSet<String>,
        window: usize,
    ) -> usize {
        if topics.is_empty() {
            return 0;
        }
        let key = subject_key(subject);
        self.window(window)
            .iter()
            .filter(|run| {
                let has_subject = run.narratives.iter().any(|n| n.subjects.contains(&key));
                let has_topic = run
                    .narratives
                    .iter()
                    .any(|n| !n.topics.is_disjoint(topics));
                has_topic && !has_subject
            })
            .count()
    }

    /// The most recent record equivalent to a narrative with this name and topic set.
    pub fn find_equivalent(
        &self,
        name: &str,
        topics: &BTreeSet<String>,
        window: usize,
    ) -> Option<&NarrativeRecord> {
        let canon = canonical_name(name);
        self.window(window)
            .iter()
            .rev()
            .flat_map(|run| run.narratives.iter())
            .find(|record| {
                word_overlap(&canon, &record.canonical_name) >= NAME_MATCH_RATIO
                    || (!topics.is_empty() && record.topics == *topics)
            })
    }

    /// Narratives from the window with no equivalent among `current`.
    pub fn faded(&self, current: &[Narrative], window: usize) -> Vec<FadedNarrative> {
        let mut faded: Vec<FadedNarrative> = Vec::new();
        for run in self.window(window).iter().rev() {
            for record in &run.narratives {
                let still_present = current.iter().any(|n| {
                    word_overlap(&canonical_name(&n.name), &record.canonical_name)
                        >= NAME_MATCH_RATIO
                        || (!n.topics.is_empty() && n.topics == record.topics)
                });
                let already_listed = faded
                    .iter()
                    .any(|f| canonical_name(&f.name) == record.canonical_name);
                if !still_present && !already_listed {
                    faded.push(FadedNarrative {
                        name: record.name.clone(),
                        last_seen: run.run_at,
                    });
                }
            }
        }
        faded
    }
}

/// Lower-case, split on non-alphanumerics, drop stop words.
pub fn canonical_name(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty() && !STOP_WORDS.contains(w))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Shared words relative to the smaller of the two word sets.
pub fn word_overlap(a: &str, b: &str) -> f64 {
    let wa: BTreeSet<&str> = a.split_whitespace().collect();
    let wb: BTreeSet<&str> = b.split_whitespace().collect();
    if wa.is_empty() || wb.is_empty() {
        return 0.0;
    }
    let shared = wa.intersection(&wb).count();
    shared as f64 / wa.len().min(wb.len()) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(name: &str, topics: &[&str], subjects: &[&str], velocity: f64) -> NarrativeRecord {
        NarrativeRecord {
            name: name.into(),
            canonical_name: canonical_name(name),
            topics: topics.iter().map(|t| t.to_string()).collect(),
            subjects: subjects.iter().map(|s| s.to_string()).collect(),
            mean_velocity: velocity,
            confidence: Confidence::Medium,
        }
    }

    fn run(day: u32, narratives: Vec<NarrativeRecord>) -> RunRecord {
        RunRecord {
            run_id: Uuid::new_v4(),
            run_at: Utc.with_ymd_and_hms(2026, 2, day, 0, 0, 0).unwrap(),
            narratives,
            baselines: vec![BaselineRecord {
                source: SignalSource::ValueFlow,
                subject: "jito".into(),
                magnitude: day as f64 * 10.0,
                observed_at: Utc.with_ymd_and_hms(2026, 2, day, 0, 0, 0).unwrap(),
            }],
        }
    }

    #[test]
    fn test_canonical_name_drops_stop_words() {
        assert_eq!(canonical_name("The Liquid Staking Protocol"), "liquid staking");
        assert_eq!(canonical_name("AI-Agents & DeFi"), "ai agents defi");
    }

    #[test]
    fn test_word_overlap() {
        assert_eq!(word_overlap("liquid staking", "staking"), 1.0);
        assert_eq!(word_overlap("liquid staking", "nft art"), 0.0);
        assert_eq!(word_overlap("", "nft"), 0.0);
    }

    #[test]
    fn test_window_limits_runs() {
        let history = HistorySnapshot::new(vec![
            run(1, vec![record("Staking", &["staking"], &["jito"], 40.0)]),
            run(2, vec![record("NFT", &["nft"], &["tensor"], 40.0)]),
        ]);
        assert_eq!(history.window(1).len(), 1);
        assert_eq!(history.window(5).len(), 2);
        assert_eq!(history.subject_runs("Jito", 1), 0);
        assert_eq!(history.subject_runs("Jito", 2), 1);
    }

    #[test]
    fn test_baseline_prefers_most_recent_run() {
        let history = HistorySnapshot::new(vec![run(1, vec![]), run(3, vec![])]);
        let baseline = history.baseline(SignalSource::ValueFlow, "JITO", 2).unwrap();
        assert_eq!(baseline.magnitude, 30.0);
        assert!(history.baseline(SignalSource::SocialMention, "jito", 2).is_none());
    }

    #[test]
    fn test_topic_only_runs() {
        let history = HistorySnapshot::new(vec![run(
            1,
            vec![record("Staking", &["staking"], &["jito"], 40.0)],
        )]);
        let topics: BTreeSet<String> = ["staking".to_string()].into();
        assert_eq!(history.topic_only_runs("marinade", &topics, 1), 1);
        assert_eq!(history.topic_only_runs("jito", &topics, 1), 0);
        assert_eq!(history.topic_only_runs("marinade", &BTreeSet::new(), 1), 0);
    }

    #[test]
    fn test_find_equivalent_by_name_or_topics() {
        let history = HistorySnapshot::new(vec![run(
            1,
            vec![record("Liquid Staking Boom", &["staking"], &["jito"], 40.0)],
        )]);
        let none = BTreeSet::new();
        assert!(history.find_equivalent("Liquid Staking", &none, 1).is_some());
        let staking: BTreeSet<String> = ["staking".to_string()].into();
        assert!(history.find_equivalent("Validators", &staking, 1).is_some());
        assert!(history.find_equivalent("NFT Art", &none, 1).is_none());
    }

    #[test]
    fn test_run_record_keeps_baselines_for_every_observed_signal() {
        use crate::model::{ClusteringMethod, SignalId, SignalSummary};

        let at = |hour| Utc.with_ymd_and_hms(2026, 2, 10, hour, 0, 0).unwrap();
        let signal = |subject: &str, magnitude: f64, hour: u32| Signal {
            id: SignalId::derive(SignalSource::SocialMention, subject, &at(hour), None),
            source: SignalSource::SocialMention,
            subject: subject.into(),
            observed_at: at(hour),
            magnitude,
            topics: BTreeSet::new(),
            url: None,
            authority_hint: false,
            summary: None,
        };
        let report = Report {
            run_id: Uuid::new_v4(),
            generated_at: at(12),
            version: "0.1.0".into(),
            narratives: Vec::new(),
            faded: Vec::new(),
            summary: SignalSummary::default(),
            clustering: ClusteringMethod::RuleBased,
            fallback_reason: None,
        };

        let observed = vec![
            signal("Jito", 5.0, 9),
            signal("jito", 8.0, 11),
            signal("Tensor", 2.0, 9),
        ];
        let record = RunRecord::from_run(&report, &observed);
        assert!(record.narratives.is_empty());
        assert_eq!(record.baselines.len(), 2);
        let jito = record.baselines.iter().find(|b| b.subject == "jito").unwrap();
        assert_eq!(jito.magnitude, 8.0);
    }

    #[test]
    fn test_recent_names_latest_sighting_first() {
        let history = HistorySnapshot::new(vec![
            run(1, vec![record("Liquid Staking", &["staking"], &["jito"], 10.0)]),
            run(2, vec![record("AI Agents", &["ai-agents"], &["acme"], 5.0)]),
            run(3, vec![
                record("liquid staking", &["staking"], &["jito"], 12.0),
                record(OTHER_NARRATIVE, &[], &["misc"], 1.0),
            ]),
        ]);
        let names = history.recent_names(5);
        assert_eq!(names.len(), 2);
        assert_eq!(names[0].0, "liquid staking");
        assert_eq!(names[0].1, history.runs[2].run_at);
        assert_eq!(names[1].0, "AI Agents");
        assert!(history.recent_names(1).iter().all(|(n, _)| n != "AI Agents"));
    }

    #[test]
    fn test_empty_history() {
        let history = HistorySnapshot::empty();
        assert!(history.is_empty());
        assert!(history.window(1).is_empty());
        assert!(history.faded(&[], 1).is_empty());
    }
}
