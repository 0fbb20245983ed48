//! Fixtures shared by the engine's unit tests.

use std::collections::BTreeSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use uuid::Uuid;

use radar_core::history::{canonical_name, HistorySnapshot, NarrativeRecord, RunRecord};
use radar_core::model::{
    Confidence, Direction, FactorScores, Narrative, ScoredSignal, Signal, SignalId, SignalSource,
};

use crate::cluster::LlmBackend;
use crate::error::ClusteringError;

/// A scored signal with neutral velocity and the given composite score.
pub fn scored(source: SignalSource, subject: &str, topics: &[&str], score: f64) -> ScoredSignal {
    let observed_at = Utc.with_ymd_and_hms(2026, 2, 10, 12, 0, 0).unwrap();
    let url = format!("https://example.test/{subject}/{score}");
    ScoredSignal {
        signal: Signal {
            id: SignalId::derive(source, subject, &observed_at, Some(&url)),
            source,
            subject: subject.into(),
            observed_at,
            magnitude: 10.0,
            topics: topics.iter().map(|t| t.to_string()).collect(),
            url: Some(url),
            authority_hint: false,
            summary: None,
        },
        score,
        factors: FactorScores {
            velocity: 50.0,
            convergence: 50.0,
            novelty: 50.0,
            authority: 25.0,
        },
    }
}

pub fn narrative(name: &str, members: Vec<ScoredSignal>) -> Narrative {
    let topics: BTreeSet<String> = members
        .iter()
        .flat_map(|m| m.signal.topics.iter().cloned())
        .collect();
    Narrative {
        name: name.into(),
        topics,
        member_signals: members,
        confidence: Confidence::Medium,
        direction: Direction::Emerging,
        explanation: String::new(),
        aggregate_score: 60.0,
        aggregate_velocity: 50.0,
        ideas: Vec::new(),
    }
}

/// History holding one earlier run with a single narrative.
pub fn history_with_narrative(name: &str, topics: &[&str], mean_velocity: f64) -> HistorySnapshot {
    HistorySnapshot::new(vec![RunRecord {
        run_id: Uuid::new_v4(),
        run_at: Utc.with_ymd_and_hms(2026, 2, 3, 12, 0, 0).unwrap(),
        narratives: vec![NarrativeRecord {
            name: name.into(),
            canonical_name: canonical_name(name),
            topics: topics.iter().map(|t| t.to_string()).collect(),
            subjects: BTreeSet::from(["earlier-subject".to_string()]),
            mean_velocity,
            confidence: Confidence::Medium,
        }],
        baselines: Vec::new(),
    }])
}

enum Script {
    Reply(String),
    Hang,
    GroupAll(String),
}

/// In-memory backend with a fixed behaviour.
pub struct ScriptedBackend {
    script: Script,
    last_prompt: Mutex<Option<String>>,
}

impl ScriptedBackend {
    fn with_script(script: Script) -> Self {
        Self {
            script,
            last_prompt: Mutex::new(None),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::with_script(Script::Reply(text.into()))
    }

    /// Never answers.
    pub fn hanging() -> Self {
        Self::with_script(Script::Hang)
    }

    /// Puts every signal id found in the prompt into one narrative.
    pub fn grouping_all(name: &str) -> Self {
        Self::with_script(Script::GroupAll(name.into()))
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str) -> Result<String, ClusteringError> {
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        match &self.script {
            Script::Reply(text) => Ok(text.clone()),
            Script::Hang => {
                std::future::pending::<()>().await;
                Err(ClusteringError::Unavailable("unreachable".into()))
            }
            Script::GroupAll(name) => {
                let ids: Vec<&str> = prompt
                    .lines()
                    .filter_map(|line| line.split(" | ").next())
                    .filter(|id| id.len() == 16 && id.chars().all(|c| c.is_ascii_hexdigit()))
                    .collect();
                Ok(serde_json::json!({
                    "narratives": [{
                        "name": name,
                        "signal_ids": ids,
                        "explanation": "Scripted explanation",
                    }]
                })
                .to_string())
            }
        }
    }
}
