use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::signal::SignalId;

/// Coarse build-effort estimate for an idea.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Complexity {
    Hours,
    Days,
    Weeks,
    Months,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hours => "HOURS",
            Self::Days => "DAYS",
            Self::Weeks => "WEEKS",
            Self::Months => "MONTHS",
        }
    }
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A build suggestion owned by exactly one narrative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Idea {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_user: Option<String>,
    pub complexity: Complexity,
    /// Ids of parent-narrative members backing this idea.
    pub supporting_evidence: Vec<SignalId>,
    pub generated_at: DateTime<Utc>,
}
