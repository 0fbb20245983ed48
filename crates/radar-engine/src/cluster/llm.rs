use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use radar_core::config::RadarConfig;
use radar_core::model::{ClusteringMethod, ScoredSignal, OTHER_NARRATIVE};

use super::{IdeaDraft, NarrativeCandidate, NarrativeClusterer};
use crate::error::ClusteringError;

/// A text-completion service used for clustering. One call per run.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Short identifier for logs, e.g. the model name.
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String, ClusteringError>;
}

/// A narrative reported by an earlier run, offered to the model so a
/// continuing theme keeps its name.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeHint {
    pub name: String,
    pub last_seen: DateTime<Utc>,
}

/// Clusters via an [`LlmBackend`], bounded by a timeout.
pub struct LlmClusterer {
    backend: Arc<dyn LlmBackend>,
    timeout: Duration,
    max_signals: usize,
    max_ideas: usize,
    hints: Vec<NarrativeHint>,
}

impl LlmClusterer {
    pub fn new(backend: Arc<dyn LlmBackend>, config: &RadarConfig) -> Self {
        Self {
            backend,
            timeout: Duration::from_secs(config.llm.timeout_secs),
            max_signals: config.llm.max_signals,
            max_ideas: config.ideas.max_per_narrative,
            hints: Vec::new(),
        }
    }

    pub fn with_hints(mut self, hints: Vec<NarrativeHint>) -> Self {
        self.hints = hints;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl NarrativeClusterer for LlmClusterer {
    fn method(&self) -> ClusteringMethod {
        ClusteringMethod::Llm
    }

    async fn cluster(
        &self,
        signals: &[ScoredSignal],
    ) -> Result<Vec<NarrativeCandidate>, ClusteringError> {
        if signals.len() > self.max_signals {
            return Err(ClusteringError::BatchTooLarge {
                size: signals.len(),
                limit: self.max_signals,
            });
        }

        let prompt = build_prompt(signals, &self.hints, self.max_ideas);
        tracing::info!(
            "Clustering {} signals with {} (timeout {:?})",
            signals.len(),
            self.backend.name(),
            self.timeout
        );
        let response = tokio::time::timeout(self.timeout, self.backend.complete(&prompt))
            .await
            .map_err(|_| ClusteringError::Timeout(self.timeout))??;

        parse_response(&response, signals, self.max_ideas)
    }
}

/// Render the structured clustering prompt.
pub fn build_prompt(
    signals: &[ScoredSignal],
    hints: &[NarrativeHint],
    max_ideas: usize,
) -> String {
    let mut prompt = String::from(
        "You are an analyst of blockchain ecosystem activity. Group the signals below into \
         coherent emerging narratives. Only group signals that genuinely share a theme; \
         leave unrelated signals out and they will be filed under \"Other\".\n\n\
         Signals (id | source | subject | topics | score | context):\n",
    );
    for s in signals {
        let topics: Vec<&str> = s.signal.topics.iter().map(String::as_str).collect();
        let context = s
            .signal
            .url
            .as_deref()
            .or(s.signal.summary.as_deref())
            .unwrap_or("-");
        let _ = writeln!(
            prompt,
            "{} | {} | {} | {} | {:.1} | {}",
            s.signal.id,
            s.signal.source,
            s.signal.subject,
            if topics.is_empty() { "-".to_string() } else { topics.join(",") },
            s.score,
            context
        );
    }
    if !hints.is_empty() {
        prompt.push_str(
            "\nPreviously reported narratives (reuse the name when a theme continues):\n",
        );
        for hint in hints {
            let _ = writeln!(
                prompt,
                "- {} (last seen {})",
                hint.name,
                hint.last_seen.format("%Y-%m-%d")
            );
        }
    }
    let _ = write!(
        prompt,
        "\nRespond with JSON only, in exactly this shape:\n\
         {{\"narratives\": [{{\"name\": \"short label\", \"signal_ids\": [\"id\", ...], \
         \"explanation\": \"why this is happening now\", \"ideas\": [{{\"name\": \"...\", \
         \"description\": \"...\", \"target_user\": \"...\"}}]}}]}}\n\
         Every id must come from the list above and appear in at most one narrative. \
         Give at most {max_ideas} ideas per narrative.\n"
    );
    prompt
}

#[derive(Debug, Deserialize)]
struct ClusterResponse {
    narratives: Vec<ClusterEntry>,
}

#[derive(Debug, Deserialize)]
struct ClusterEntry {
    name: String,
    #[serde(default)]
    signal_ids: Vec<String>,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    ideas: Vec<IdeaEntry>,
}

#[derive(Debug, Deserialize)]
struct IdeaEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    target_user: Option<String>,
}

/// Validate a clustering response against the batch it was asked about.
///
/// Unknown ids, ids assigned twice, blank or repeated names and unparseable
/// JSON are errors. Signals the response leaves out are collected into "Other".
pub fn parse_response(
    response: &str,
    signals: &[ScoredSignal],
    max_ideas: usize,
) -> Result<Vec<NarrativeCandidate>, ClusteringError> {
    let json = extract_json_object(response)
        .ok_or_else(|| ClusteringError::Malformed("no JSON object in response".into()))?;
    let parsed: ClusterResponse =
        serde_json::from_str(json).map_err(|e| ClusteringError::Malformed(e.to_string()))?;
    if parsed.narratives.is_empty() {
        return Err(ClusteringError::Malformed("response contains no narratives".into()));
    }

    let by_id: HashMap<&str, &ScoredSignal> =
        signals.iter().map(|s| (s.signal.id.as_str(), s)).collect();
    let mut assigned: HashSet<&str> = HashSet::new();
    let mut names: HashSet<String> = HashSet::new();
    let mut candidates: Vec<NarrativeCandidate> = Vec::new();
    let mut other = NarrativeCandidate::new(OTHER_NARRATIVE, Vec::new());

    for entry in parsed.narratives {
        let name = entry.name.trim();
        if name.is_empty() {
            return Err(ClusteringError::Malformed("narrative with an empty name".into()));
        }
        let is_other = name.eq_ignore_ascii_case(OTHER_NARRATIVE);
        if !is_other && !names.insert(name.to_lowercase()) {
            return Err(ClusteringError::Malformed(format!(
                "narrative {name:?} appears more than once"
            )));
        }

        let mut members = Vec::with_capacity(entry.signal_ids.len());
        for raw_id in &entry.signal_ids {
            let id = raw_id.trim();
            let Some((key, signal)) = by_id.get_key_value(id) else {
                return Err(ClusteringError::UnknownSignal(id.to_string()));
            };
            if !assigned.insert(*key) {
                return Err(ClusteringError::DuplicateAssignment(id.to_string()));
            }
            members.push((*signal).clone());
        }
        if members.is_empty() {
            tracing::debug!("Ignoring empty LLM narrative {name:?}");
            continue;
        }

        let explanation = entry
            .explanation
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());

        if is_other {
            other.members.extend(members);
            other.explanation = other.explanation.or(explanation);
            continue;
        }

        candidates.push(NarrativeCandidate {
            name: name.to_string(),
            members,
            explanation,
            ideas: idea_drafts(entry.ideas, max_ideas),
        });
    }

    other.members.extend(
        signals
            .iter()
            .filter(|s| !assigned.contains(s.signal.id.as_str()))
            .cloned(),
    );
    if !other.members.is_empty() {
        candidates.push(other);
    }
    if candidates.is_empty() {
        return Err(ClusteringError::Malformed("no narrative has members".into()));
    }

    Ok(candidates)
}

/// Keep LLM ideas only if every one of them is well-formed.
fn idea_drafts(entries: Vec<IdeaEntry>, max_ideas: usize) -> Vec<IdeaDraft> {
    let drafts: Vec<IdeaDraft> = entries
        .into_iter()
        .take(max_ideas)
        .map(|e| IdeaDraft {
            name: e.name.trim().to_string(),
            description: e.description.trim().to_string(),
            target_user: e
                .target_user
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
        })
        .collect();
    if drafts
        .iter()
        .any(|d| d.name.is_empty() || d.description.is_empty())
    {
        tracing::debug!("Discarding malformed LLM ideas");
        return Vec::new();
    }
    drafts
}

/// The text between the first `{` and the last `}`; tolerates code fences and prose.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
