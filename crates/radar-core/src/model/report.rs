use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::narrative::Narrative;
use super::signal::SignalSource;

/// Which clustering strategy produced the narratives of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusteringMethod {
    Llm,
    RuleBased,
}

impl std::fmt::Display for ClusteringMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Llm => f.write_str("llm"),
            Self::RuleBased => f.write_str("rule_based"),
        }
    }
}

/// Aggregate counts for the batch a report was built from.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SignalSummary {
    pub raw_records: usize,
    pub rejected_records: usize,
    pub normalized_signals: usize,
    pub by_source: BTreeMap<SignalSource, usize>,
    pub passing_signals: usize,
}

/// A narrative seen in the history window but not re-detected this run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FadedNarrative {
    pub name: String,
    pub last_seen: DateTime<Utc>,
}

/// The complete, self-contained output of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub version: String,
    /// Ranked: confidence, then aggregate score, then name.
    pub narratives: Vec<Narrative>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub faded: Vec<FadedNarrative>,
    pub summary: SignalSummary,
    pub clustering: ClusteringMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

impl Report {
    pub fn idea_count(&self) -> usize {
        self.narratives.iter().map(|n| n.ideas.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.narratives.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_serde_roundtrip() {
        let mut by_source = BTreeMap::new();
        by_source.insert(SignalSource::ValueFlow, 3);
        let report = Report {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            version: "0.1.0".into(),
            narratives: Vec::new(),
            faded: Vec::new(),
            summary: SignalSummary {
                raw_records: 3,
                rejected_records: 0,
                normalized_signals: 3,
                by_source,
                passing_signals: 0,
            },
            clustering: ClusteringMethod::RuleBased,
            fallback_reason: None,
        };
        let json = serde_json::to_string_pretty(&report).unwrap();
        assert!(json.contains("\"value-flow\": 3"));
        assert!(!json.contains("fallback_reason"));
        let parsed: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(report, parsed);
        assert!(parsed.is_empty());
        assert_eq!(parsed.idea_count(), 0);
    }
}
