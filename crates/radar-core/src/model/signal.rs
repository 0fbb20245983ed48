use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The collector family a signal came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalSource {
    RepositoryActivity,
    ValueFlow,
    SocialMention,
}

impl SignalSource {
    pub const ALL: [SignalSource; 3] = [
        SignalSource::RepositoryActivity,
        SignalSource::ValueFlow,
        SignalSource::SocialMention,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RepositoryActivity => "repository-activity",
            Self::ValueFlow => "value-flow",
            Self::SocialMention => "social-mention",
        }
    }
}

impl std::fmt::Display for SignalSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identifier for a signal within and across batches.
/// First 16 hex chars of SHA-256 over (source, subject key, observed_at, url).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SignalId(pub String);

impl SignalId {
    pub fn derive(
        source: SignalSource,
        subject: &str,
        observed_at: &DateTime<Utc>,
        url: Option<&str>,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(source.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(subject_key(subject).as_bytes());
        hasher.update([0u8]);
        hasher.update(observed_at.to_rfc3339().as_bytes());
        hasher.update([0u8]);
        hasher.update(url.unwrap_or_default().as_bytes());
        let hex = format!("{:x}", hasher.finalize());
        Self(hex[..16].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SignalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SignalId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lower-cased, whitespace-collapsed form of a subject used for grouping.
pub fn subject_key(subject: &str) -> String {
    subject
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// One normalized observation from a single source. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Signal {
    pub id: SignalId,
    pub source: SignalSource,
    pub subject: String,
    pub observed_at: DateTime<Utc>,
    pub magnitude: f64,
    #[serde(default)]
    pub topics: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub authority_hint: bool,
    /// Short free-text context carried along for provenance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Signal {
    pub fn subject_key(&self) -> String {
        subject_key(&self.subject)
    }
}

/// The four factor sub-scores, each in [0, 100].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct FactorScores {
    pub velocity: f64,
    pub convergence: f64,
    pub novelty: f64,
    pub authority: f64,
}

/// A signal plus its composite score. Derived, read-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredSignal {
    pub signal: Signal,
    pub score: f64,
    pub factors: FactorScores,
}

impl ScoredSignal {
    pub fn id(&self) -> &SignalId {
        &self.signal.id
    }
}
