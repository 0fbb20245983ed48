use std::collections::{BTreeSet, HashMap};

use radar_core::config::RadarConfig;
use radar_core::history::HistorySnapshot;
use radar_core::model::{subject_key, FactorScores, ScoredSignal, Signal, SignalSource};

/// Source count at which convergence reaches ~63% of its range.
const CONVERGENCE_SCALE: f64 = 1.6;

/// Four-factor composite scorer. Pure function of (batch, history, config).
pub struct Scorer<'a> {
    config: &'a RadarConfig,
    history: &'a HistorySnapshot,
    verified: BTreeSet<String>,
}

impl<'a> Scorer<'a> {
    pub fn new(config: &'a RadarConfig, history: &'a HistorySnapshot) -> Self {
        let verified = config
            .authority
            .verified_subjects
            .iter()
            .map(|s| subject_key(s))
            .collect();
        Self {
            config,
            history,
            verified,
        }
    }

    /// Score every signal of a batch. Output order matches input order.
    pub fn score_batch(&self, signals: &[Signal]) -> Vec<ScoredSignal> {
        let corroboration = Corroboration::build(signals);
        signals
            .iter()
            .map(|signal| {
                let sources = corroboration.sources_for(signal);
                self.score(signal, sources)
            })
            .collect()
    }

    /// Score one signal given the number of distinct sources corroborating it.
    pub fn score(&self, signal: &Signal, distinct_sources: usize) -> ScoredSignal {
        let factors = FactorScores {
            velocity: self.velocity(signal),
            convergence: convergence(distinct_sources),
            novelty: self.novelty(signal),
            authority: self.authority(signal),
        };
        let score = composite(&factors, self.config);
        tracing::debug!(
            "Scored {} ({}): {score:.1} [v={:.1} c={:.1} n={:.1} a={:.1}]",
            signal.subject,
            signal.source,
            factors.velocity,
            factors.convergence,
            factors.novelty,
            factors.authority
        );
        ScoredSignal {
            signal: signal.clone(),
            score,
            factors,
        }
    }

    /// Growth against the most recent baseline for this (source, subject),
    /// expressed per reference window and squashed with a soft-sign.
    fn velocity(&self, signal: &Signal) -> f64 {
        let cfg = &self.config.velocity;
        let Some(baseline) =
            self.history
                .baseline(signal.source, &signal.subject, self.config.history.window)
        else {
            return cfg.neutral;
        };

        let elapsed_days =
            (signal.observed_at - baseline.observed_at).num_seconds() as f64 / 86_400.0;
        let growth = (signal.magnitude - baseline.magnitude) / baseline.magnitude.max(1.0);
        let rate = growth * cfg.reference_window_days / elapsed_days.max(1.0);
        let squashed = if rate.is_infinite() {
            rate.signum()
        } else {
            rate / (1.0 + rate.abs())
        };

        let span = if squashed >= 0.0 {
            100.0 - cfg.neutral
        } else {
            cfg.neutral
        };
        clamp_score(cfg.neutral + squashed * span)
    }

    fn novelty(&self, signal: &Signal) -> f64 {
        let window = self.config.history.window;
        let seen = self.history.subject_runs(&signal.subject, window);
        let topic_only = self
            .history
            .topic_only_runs(&signal.subject, &signal.topics, window);
        let cfg = &self.config.novelty;
        clamp_score(
            100.0 * cfg.subject_decay.powi(seen as i32) * cfg.topic_decay.powi(topic_only as i32),
        )
    }

    fn authority(&self, signal: &Signal) -> f64 {
        let cfg = &self.config.authority;
        let verified = self.verified.contains(&signal.subject_key());
        match (signal.authority_hint, verified) {
            (true, true) => cfg.hinted_and_verified,
            (true, false) => cfg.hinted,
            (false, true) => cfg.verified,
            (false, false) => cfg.baseline,
        }
    }
}

/// Diminishing-returns curve over distinct corroborating sources:
/// 1 → ~32, 2 → ~79, 3 → ~97.
pub fn convergence(distinct_sources: usize) -> f64 {
    let k = distinct_sources as f64 / CONVERGENCE_SCALE;
    clamp_score(100.0 * (1.0 - (-(k * k)).exp()))
}

/// Weighted sum of the factors, clamped to [0, 100] and rounded to 0.1.
pub fn composite(factors: &FactorScores, config: &RadarConfig) -> f64 {
    let w = &config.weights;
    let raw = factors.velocity * w.velocity
        + factors.convergence * w.convergence
        + factors.novelty * w.novelty
        + factors.authority * w.authority;
    (clamp_score(raw) * 10.0).round() / 10.0
}

fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Which sources touch each subject and each topic within the batch.
struct Corroboration {
    by_subject: HashMap<String, BTreeSet<SignalSource>>,
    by_topic: HashMap<String, BTreeSet<SignalSource>>,
}

impl Corroboration {
    fn build(signals: &[Signal]) -> Self {
        let mut by_subject: HashMap<String, BTreeSet<SignalSource>> = HashMap::new();
        let mut by_topic: HashMap<String, BTreeSet<SignalSource>> = HashMap::new();
        for signal in signals {
            by_subject
                .entry(signal.subject_key())
                .or_default()
                .insert(signal.source);
            for topic in &signal.topics {
                by_topic.entry(topic.clone()).or_default().insert(signal.source);
            }
        }
        Self {
            by_subject,
            by_topic,
        }
    }

    fn sources_for(&self, signal: &Signal) -> usize {
        let mut sources: BTreeSet<SignalSource> = BTreeSet::from([signal.source]);
        if let Some(s) = self.by_subject.get(&signal.subject_key()) {
            sources.extend(s);
        }
        for topic in &signal.topics {
            if let Some(s) = self.by_topic.get(topic) {
                sources.extend(s);
            }
        }
        sources.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use radar_core::history::{BaselineRecord, NarrativeRecord, RunRecord};
    use radar_core::model::{Confidence, SignalId};
    use uuid::Uuid;

    fn signal(source: SignalSource, subject: &str, topics: &[&str], magnitude: f64) -> Signal {
        let observed_at = Utc.with_ymd_and_hms(2026, 2, 10, 0, 0, 0).unwrap();
        Signal {
            id: SignalId::derive(source, subject, &observed_at, None),
            source,
            subject: subject.into(),
            observed_at,
            magnitude,
            topics: topics.iter().map(|t| t.to_string()).collect(),
            url: None,
            authority_hint: false,
            summary: None,
        }
    }

    fn history_with(
        subject: &str,
        topics: &[&str],
        magnitude: f64,
        days_ago: i64,
    ) -> HistorySnapshot {
        let run_at =
            Utc.with_ymd_and_hms(2026, 2, 10, 0, 0, 0).unwrap() - Duration::days(days_ago);
        HistorySnapshot::new(vec![RunRecord {
            run_id: Uuid::new_v4(),
            run_at,
            narratives: vec![NarrativeRecord {
                name: "Staking".into(),
                canonical_name: "staking".into(),
                topics: topics.iter().map(|t| t.to_string()).collect(),
                subjects: [subject_key(subject)].into(),
                mean_velocity: 50.0,
                confidence: Confidence::Medium,
            }],
            baselines: vec![BaselineRecord {
                source: SignalSource::ValueFlow,
                subject: subject_key(subject),
                magnitude,
                observed_at: run_at,
            }],
        }])
    }

    #[test]
    fn test_scores_bounded_and_deterministic() {
        let config = RadarConfig::default();
        let history = HistorySnapshot::empty();
        let scorer = Scorer::new(&config, &history);
        let batch = vec![
            signal(SignalSource::RepositoryActivity, "acme/a", &["defi"], 1e12),
            signal(SignalSource::ValueFlow, "Kamino", &["defi"], 0.0),
            signal(SignalSource::SocialMention, "Kamino", &[], 3.0),
        ];
        let first = scorer.score_batch(&batch);
        let second = scorer.score_batch(&batch);
        assert_eq!(first, second);
        for s in &first {
            assert!((0.0..=100.0).contains(&s.score));
        }
    }

    #[test]
    fn test_convergence_monotonic() {
        let values: Vec<f64> = (0..6).map(convergence).collect();
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
        assert!(values[1] < 40.0);
        assert!(values[2] > 70.0 && values[2] < 90.0);
        assert!(values[3] > 95.0);
    }

    #[test]
    fn test_convergence_counts_subject_and_topic_overlap() {
        let config = RadarConfig::default();
        let history = HistorySnapshot::empty();
        let scorer = Scorer::new(&config, &history);
        let batch = vec![
            signal(SignalSource::RepositoryActivity, "jito", &[], 1.0),
            signal(SignalSource::ValueFlow, "Jito", &["staking"], 1.0),
            signal(SignalSource::SocialMention, "marinade", &["staking"], 1.0),
            signal(SignalSource::SocialMention, "tensor", &["nft"], 1.0),
        ];
        let scored = scorer.score_batch(&batch);
        assert_eq!(scored[0].factors.convergence, convergence(2));
        assert_eq!(scored[1].factors.convergence, convergence(3));
        assert_eq!(scored[3].factors.convergence, convergence(1));
    }

    #[test]
    fn test_velocity_neutral_without_baseline() {
        let config = RadarConfig::default();
        let history = HistorySnapshot::empty();
        let scorer = Scorer::new(&config, &history);
        let scored = scorer.score(&signal(SignalSource::ValueFlow, "jito", &[], 10.0), 1);
        assert_eq!(scored.factors.velocity, 50.0);
    }

    #[test]
    fn test_velocity_tracks_growth_against_baseline() {
        let config = RadarConfig::default();
        let history = history_with("jito", &["staking"], 100.0, 7);
        let scorer = Scorer::new(&config, &history);
        let up = scorer.score(&signal(SignalSource::ValueFlow, "jito", &[], 200.0), 1);
        let flat = scorer.score(&signal(SignalSource::ValueFlow, "jito", &[], 100.0), 1);
        let down = scorer.score(&signal(SignalSource::ValueFlow, "jito", &[], 10.0), 1);
        assert!(up.factors.velocity > 50.0);
        assert_eq!(flat.factors.velocity, 50.0);
        assert!(down.factors.velocity < 50.0);
        // Baselines are per source
        let other = scorer.score(&signal(SignalSource::SocialMention, "jito", &[], 200.0), 1);
        assert_eq!(other.factors.velocity, 50.0);
    }

    #[test]
    fn test_velocity_saturates_on_overflowing_growth() {
        let config = RadarConfig::default();
        let history = history_with("jito", &["staking"], 0.5, 7);
        let scorer = Scorer::new(&config, &history);
        let huge = scorer.score(&signal(SignalSource::ValueFlow, "jito", &[], f64::MAX), 1);
        assert_eq!(huge.factors.velocity, 100.0);
    }

    #[test]
    fn test_novelty_decays_with_history() {
        let config = RadarConfig::default();
        let history = history_with("jito", &["staking"], 100.0, 1);
        let scorer = Scorer::new(&config, &history);
        let fresh = scorer.score(&signal(SignalSource::ValueFlow, "tensor", &["nft"], 1.0), 1);
        let seen = scorer.score(&signal(SignalSource::ValueFlow, "jito", &["staking"], 1.0), 1);
        let same_topic =
            scorer.score(&signal(SignalSource::ValueFlow, "sanctum", &["staking"], 1.0), 1);
        assert_eq!(fresh.factors.novelty, 100.0);
        assert_eq!(seen.factors.novelty, 50.0);
        assert!((same_topic.factors.novelty - 85.0).abs() < 1e-9);
    }

    #[test]
    fn test_authority_steps() {
        let mut config = RadarConfig::default();
        config.authority.verified_subjects = vec!["Jito".into()];
        let history = HistorySnapshot::empty();
        let scorer = Scorer::new(&config, &history);

        let mut hinted = signal(SignalSource::SocialMention, "nobody", &[], 1.0);
        hinted.authority_hint = true;
        let mut both = signal(SignalSource::SocialMention, "jito", &[], 1.0);
        both.authority_hint = true;

        let plain = signal(SignalSource::SocialMention, "nobody", &[], 1.0);
        let listed = signal(SignalSource::SocialMention, "JITO", &[], 1.0);
        assert_eq!(scorer.score(&plain, 1).factors.authority, 25.0);
        assert_eq!(scorer.score(&hinted, 1).factors.authority, 80.0);
        assert_eq!(scorer.score(&listed, 1).factors.authority, 70.0);
        assert_eq!(scorer.score(&both, 1).factors.authority, 100.0);
    }

    #[test]
    fn test_composite_uses_weights() {
        let config = RadarConfig::default();
        let factors = FactorScores {
            velocity: 100.0,
            convergence: 0.0,
            novelty: 0.0,
            authority: 0.0,
        };
        assert_eq!(composite(&factors, &config), 30.0);
    }
}
