use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use radar_core::config::RadarConfig;
use radar_core::history::{HistorySnapshot, RunRecord};
use radar_core::model::{ClusteringMethod, Narrative, Report, ScoredSignal, Signal};
use radar_ingest::{normalize, RawBatch};

use crate::cluster::{
    LlmBackend, LlmClusterer, NarrativeClusterer, NarrativeHint, RuleBasedClusterer,
};
use crate::error::EngineError;
use crate::gate;
use crate::ideas::IdeaGenerator;
use crate::report::{assemble, RunMeta};
use crate::score::Scorer;
use crate::synthesize::Synthesizer;

/// Ranked narratives plus how they were clustered.
#[derive(Debug, Clone)]
pub struct Narration {
    pub narratives: Vec<Narrative>,
    pub method: ClusteringMethod,
    pub fallback_reason: Option<String>,
}

/// A finished report together with the history entry it leaves behind.
#[derive(Debug, Clone)]
pub struct RecordedRun {
    pub report: Report,
    pub record: RunRecord,
}

/// Normalizer → Scorer → Gate → Clusterer → Synthesizer → Ideas → Report.
///
/// The engine holds no state between runs. History is passed in read-only;
/// callers serialize runs that share a history store.
pub struct Engine {
    config: RadarConfig,
    backend: Option<Arc<dyn LlmBackend>>,
}

impl Engine {
    /// Validates the configuration up front; a bad config never starts a run.
    pub fn new(config: RadarConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            backend: None,
        })
    }

    pub fn with_backend(mut self, backend: Arc<dyn LlmBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn config(&self) -> &RadarConfig {
        &self.config
    }

    /// Score a normalized batch without gating.
    pub fn score(&self, signals: &[Signal], history: &HistorySnapshot) -> Vec<ScoredSignal> {
        Scorer::new(&self.config, history).score_batch(signals)
    }

    /// Run the whole pipeline over one raw batch.
    pub async fn run(
        &self,
        batch: &RawBatch,
        history: &HistorySnapshot,
    ) -> Result<Report, EngineError> {
        Ok(self.run_recorded(batch, history).await?.report)
    }

    /// Like [`Engine::run`], also returning the history entry to append.
    /// Its baselines cover every normalized signal, gated or not.
    pub async fn run_recorded(
        &self,
        batch: &RawBatch,
        history: &HistorySnapshot,
    ) -> Result<RecordedRun, EngineError> {
        let run_id = Uuid::new_v4();
        let generated_at = Utc::now();
        tracing::info!("Starting run {run_id} over {} raw records", batch.len());

        let normalized = normalize(&batch.records);
        let rejected = batch.malformed + normalized.rejected;
        if normalized.signals.is_empty() && !batch.is_empty() {
            return Err(EngineError::NoUsableInput(rejected));
        }

        let scored = self.score(&normalized.signals, history);
        let passed = gate::apply(scored, self.config.gate.threshold).passed;
        let passing_signals = passed.len();

        let narration = self.narrate(passed, history, generated_at).await;
        let narratives = narration.narratives;
        let faded = history.faded(&narratives, self.config.history.window);

        let meta = RunMeta {
            run_id,
            generated_at,
            raw_records: batch.len(),
            rejected_records: rejected,
            passing_signals,
        };
        let report = assemble(
            meta,
            narratives,
            faded,
            &normalized.signals,
            narration.method,
            narration.fallback_reason,
        );
        tracing::info!(
            "Run {run_id} produced {} narratives and {} ideas ({})",
            report.narratives.len(),
            report.idea_count(),
            report.clustering
        );
        let record = RunRecord::from_run(&report, &normalized.signals);
        Ok(RecordedRun { report, record })
    }

    /// Cluster and synthesize passing signals. Never fails: any LLM problem
    /// re-runs the whole batch through the rule-based strategy.
    pub async fn narrate(
        &self,
        passed: Vec<ScoredSignal>,
        history: &HistorySnapshot,
        generated_at: DateTime<Utc>,
    ) -> Narration {
        let rule_based = RuleBasedClusterer::new(&self.config.clustering);
        if passed.is_empty() {
            return Narration {
                narratives: Vec::new(),
                method: ClusteringMethod::RuleBased,
                fallback_reason: None,
            };
        }

        let primary: Box<dyn NarrativeClusterer> = match self.llm_clusterer(history) {
            Some(llm) => Box::new(llm),
            None => Box::new(rule_based.clone()),
        };
        let (candidates, method, fallback_reason) = match primary.cluster(&passed).await {
            Ok(candidates) => (candidates, primary.method(), None),
            Err(e) => {
                tracing::warn!("LLM clustering failed, using rule-based fallback: {e}");
                let fallback: &dyn NarrativeClusterer = &rule_based;
                let candidates = match fallback.cluster(&passed).await {
                    Ok(candidates) => candidates,
                    Err(_) => rule_based.partition(&passed),
                };
                (candidates, fallback.method(), Some(e.to_string()))
            }
        };

        let synthesized = Synthesizer::new(&self.config, history).synthesize(candidates);
        let narratives = synthesized
            .into_iter()
            .map(|s| {
                let mut narrative = s.narrative;
                narrative.ideas = IdeaGenerator::new(&self.config.ideas).generate(
                    &narrative,
                    &s.idea_drafts,
                    generated_at,
                );
                narrative
            })
            .collect();

        Narration {
            narratives,
            method,
            fallback_reason,
        }
    }

    fn llm_clusterer(&self, history: &HistorySnapshot) -> Option<LlmClusterer> {
        if !self.config.llm.enabled {
            return None;
        }
        let hints: Vec<NarrativeHint> = history
            .recent_names(self.config.history.window)
            .into_iter()
            .map(|(name, last_seen)| NarrativeHint { name, last_seen })
            .collect();
        self.backend
            .as_ref()
            .map(|backend| LlmClusterer::new(Arc::clone(backend), &self.config).with_hints(hints))
    }
}
