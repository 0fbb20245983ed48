use serde::{Deserialize, Serialize};

use radar_core::model::SignalSource;

/// Stars at or above this mark a repository as credible.
pub const AUTHORITY_MIN_STARS: f64 = 500.0;
/// TVL at or above this marks a protocol as credible.
pub const AUTHORITY_MIN_TVL: f64 = 100_000_000.0;

/// A raw record in its collector's native shape, tagged by `source`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "source", rename_all = "kebab-case")]
pub enum RawRecord {
    RepositoryActivity(RepositoryRecord),
    ValueFlow(ValueFlowRecord),
    SocialMention(SocialRecord),
}

/// Code-repository activity, e.g. a newly created or trending repo.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RepositoryRecord {
    /// `owner/repo`.
    #[serde(default, alias = "full_name")]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub stars: Option<f64>,
    #[serde(default)]
    pub star_delta: Option<f64>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub pushed_at: Option<String>,
    /// Collection time; falls back to `pushed_at`.
    #[serde(default)]
    pub observed_at: Option<String>,
    #[serde(default)]
    pub owner_verified: bool,
}

/// Protocol value-flow, e.g. TVL movement.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ValueFlowRecord {
    /// Protocol name.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub tvl: Option<f64>,
    #[serde(default)]
    pub tvl_delta: Option<f64>,
    /// Percent change over seven days.
    #[serde(default)]
    pub change_7d: Option<f64>,
    #[serde(default)]
    pub observed_at: Option<String>,
}

/// A social mention, e.g. a post naming a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SocialRecord {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Mention or engagement count.
    #[serde(default, alias = "engagement")]
    pub mentions: Option<f64>,
    #[serde(default)]
    pub kol: bool,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub observed_at: Option<String>,
}

impl RawRecord {
    pub fn source(&self) -> SignalSource {
        match self {
            Self::RepositoryActivity(_) => SignalSource::RepositoryActivity,
            Self::ValueFlow(_) => SignalSource::ValueFlow,
            Self::SocialMention(_) => SignalSource::SocialMention,
        }
    }

    pub fn subject(&self) -> Option<&str> {
        let subject = match self {
            Self::RepositoryActivity(r) => r.name.as_deref(),
            Self::ValueFlow(r) => r.name.as_deref(),
            Self::SocialMention(r) => r.subject.as_deref(),
        };
        subject.map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn observed_at(&self) -> Option<&str> {
        let ts = match self {
            Self::RepositoryActivity(r) => r.observed_at.as_deref().or(r.pushed_at.as_deref()),
            Self::ValueFlow(r) => r.observed_at.as_deref(),
            Self::SocialMention(r) => r.observed_at.as_deref(),
        };
        ts.map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Self::RepositoryActivity(r) => r.url.as_deref(),
            Self::ValueFlow(r) => r.url.as_deref(),
            Self::SocialMention(r) => r.url.as_deref(),
        }
    }

    /// Source-specific activity measure before validation. Missing inputs count as zero.
    pub fn raw_magnitude(&self) -> f64 {
        match self {
            Self::RepositoryActivity(r) => r.star_delta.or(r.stars).unwrap_or(0.0).abs(),
            Self::ValueFlow(r) => match (r.tvl_delta, r.tvl, r.change_7d) {
                (Some(delta), _, _) => delta.abs(),
                (None, Some(tvl), Some(pct)) => (tvl * pct / 100.0).abs(),
                _ => 0.0,
            },
            Self::SocialMention(r) => r.mentions.unwrap_or(1.0),
        }
    }

    pub fn authority_hint(&self) -> bool {
        match self {
            Self::RepositoryActivity(r) => {
                r.owner_verified || r.stars.is_some_and(|s| s >= AUTHORITY_MIN_STARS)
            }
            Self::ValueFlow(r) => r.tvl.is_some_and(|t| t >= AUTHORITY_MIN_TVL),
            Self::SocialMention(r) => r.kol || r.verified,
        }
    }

    /// Free text fed to topic extraction.
    pub fn topic_text(&self) -> Vec<&str> {
        let mut texts: Vec<&str> = Vec::new();
        match self {
            Self::RepositoryActivity(r) => {
                texts.extend(r.name.as_deref());
                texts.extend(r.description.as_deref());
                texts.extend(r.topics.iter().map(String::as_str));
            }
            Self::ValueFlow(r) => {
                texts.extend(r.name.as_deref());
                texts.extend(r.category.as_deref());
                texts.extend(r.description.as_deref());
            }
            Self::SocialMention(r) => {
                texts.extend(r.subject.as_deref());
                texts.extend(r.content.as_deref());
            }
        }
        texts
    }

    /// Short provenance text carried on the signal.
    pub fn summary(&self) -> Option<&str> {
        let text = match self {
            Self::RepositoryActivity(r) => r.description.as_deref(),
            Self::ValueFlow(r) => r.category.as_deref(),
            Self::SocialMention(r) => r.content.as_deref(),
        };
        text.map(str::trim).filter(|s| !s.is_empty())
    }

    /// Human-readable identity for log lines.
    pub fn describe(&self, index: usize) -> String {
        match self.subject() {
            Some(subject) => format!("{}#{index} ({subject})", self.source()),
            None => format!("{}#{index}", self.source()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_tagged_records() {
        let json = r#"[
            {"source": "repository-activity", "full_name": "acme/vault", "stars": 900, "star_delta": -12},
            {"source": "value-flow", "name": "Jito", "tvl": 2.0e9, "change_7d": 5.0},
            {"source": "social-mention", "subject": "Jito", "engagement": 40, "kol": true}
        ]"#;
        let records: Vec<RawRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].subject(), Some("acme/vault"));
        assert_eq!(records[0].raw_magnitude(), 12.0);
        assert!(records[0].authority_hint());
        assert_eq!(records[1].raw_magnitude(), 1.0e8);
        assert!(records[1].authority_hint());
        assert_eq!(records[2].raw_magnitude(), 40.0);
        assert!(records[2].authority_hint());
    }

    #[test]
    fn test_repository_observed_at_falls_back_to_pushed_at() {
        let record = RawRecord::RepositoryActivity(RepositoryRecord {
            name: Some("a/b".into()),
            pushed_at: Some("2026-02-10T00:00:00Z".into()),
            ..Default::default()
        });
        assert_eq!(record.observed_at(), Some("2026-02-10T00:00:00Z"));
    }

    #[test]
    fn test_blank_subject_is_missing() {
        let record = RawRecord::SocialMention(SocialRecord {
            subject: Some("   ".into()),
            ..Default::default()
        });
        assert_eq!(record.subject(), None);
        assert_eq!(record.describe(4), "social-mention#4");
    }

    #[test]
    fn test_value_flow_prefers_explicit_delta() {
        let record = RawRecord::ValueFlow(ValueFlowRecord {
            name: Some("Kamino".into()),
            tvl: Some(50.0),
            tvl_delta: Some(-7.5),
            change_7d: Some(80.0),
            ..Default::default()
        });
        assert_eq!(record.raw_magnitude(), 7.5);
        assert!(!record.authority_hint());
    }
}
