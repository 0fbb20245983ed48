use chrono::{DateTime, Utc};
use uuid::Uuid;

use radar_core::config::IdeasConfig;
use radar_core::model::{Complexity, Idea, Narrative, SignalId};

use crate::cluster::IdeaDraft;

/// How many top members each idea cites as evidence.
const EVIDENCE_PER_IDEA: usize = 3;

/// Build effort for a product in each topic.
const TOPIC_COMPLEXITY: &[(&str, Complexity)] = &[
    ("ai-agents", Complexity::Weeks),
    ("bridge", Complexity::Months),
    ("defi", Complexity::Weeks),
    ("depin", Complexity::Months),
    ("gaming", Complexity::Months),
    ("identity", Complexity::Weeks),
    ("infra", Complexity::Months),
    ("memecoins", Complexity::Days),
    ("nft", Complexity::Days),
    ("payments", Complexity::Weeks),
    ("privacy", Complexity::Months),
    ("rwa", Complexity::Months),
    ("social", Complexity::Days),
    ("staking", Complexity::Weeks),
    ("trading", Complexity::Weeks),
];

/// Words marking an idea as informational or aggregation work.
const INFORMATIONAL_WORDS: &[&str] = &[
    "dashboard", "tracker", "aggregator", "analytics", "alert", "alerts", "monitor", "digest",
    "newsletter", "explorer", "leaderboard",
];

const TARGET_USERS: &[(&str, &str)] = &[
    ("ai-agents", "Agent developers"),
    ("defi", "DeFi traders and liquidity providers"),
    ("gaming", "Game studios"),
    ("infra", "Protocol engineers"),
    ("nft", "Creators and collectors"),
    ("payments", "Merchants and fintech teams"),
    ("rwa", "Asset issuers"),
    ("staking", "Stakers and validator operators"),
    ("trading", "Active traders"),
];

/// Derives 1..=`max_per_narrative` ideas for each narrative.
pub struct IdeaGenerator<'a> {
    config: &'a IdeasConfig,
}

impl<'a> IdeaGenerator<'a> {
    pub fn new(config: &'a IdeasConfig) -> Self {
        Self { config }
    }

    /// Use well-formed backend drafts when present, otherwise templates.
    /// A narrative with members always gets at least one idea.
    pub fn generate(
        &self,
        narrative: &Narrative,
        drafts: &[IdeaDraft],
        generated_at: DateTime<Utc>,
    ) -> Vec<Idea> {
        if narrative.member_signals.is_empty() {
            return Vec::new();
        }
        let limit = self.config.max_per_narrative.clamp(1, 5);
        let evidence: Vec<SignalId> = narrative
            .top_members(EVIDENCE_PER_IDEA)
            .into_iter()
            .map(|m| m.signal.id.clone())
            .collect();
        let build = topic_complexity(narrative);

        let candidates: Vec<(IdeaDraft, Complexity)> = if drafts.is_empty() {
            templates(narrative, build)
        } else {
            drafts.iter().map(|d| (d.clone(), classify(d, build))).collect()
        };

        candidates
            .into_iter()
            .take(limit)
            .map(|(draft, complexity)| Idea {
                id: Uuid::new_v4(),
                target_user: draft.target_user.or_else(|| default_target_user(narrative)),
                name: draft.name,
                description: draft.description,
                complexity,
                supporting_evidence: evidence.clone(),
                generated_at,
            })
            .collect()
    }
}

/// The heaviest build effort among the narrative's topics; WEEKS when untagged.
pub fn topic_complexity(narrative: &Narrative) -> Complexity {
    narrative
        .topics
        .iter()
        .filter_map(|t| {
            TOPIC_COMPLEXITY
                .iter()
                .find(|(topic, _)| topic == t)
                .map(|(_, c)| *c)
        })
        .max()
        .unwrap_or(Complexity::Weeks)
}

/// DAYS for informational work, otherwise the topic's build effort.
pub fn classify(draft: &IdeaDraft, build: Complexity) -> Complexity {
    let text = format!("{} {}", draft.name, draft.description).to_lowercase();
    let informational = text
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| INFORMATIONAL_WORDS.contains(&w));
    if informational {
        Complexity::Days
    } else {
        build
    }
}

fn default_target_user(narrative: &Narrative) -> Option<String> {
    narrative
        .topics
        .iter()
        .find_map(|t| TARGET_USERS.iter().find(|(topic, _)| topic == t))
        .map(|(_, user)| user.to_string())
        .or_else(|| Some(format!("Builders following {}", narrative.name)))
}

fn templates(narrative: &Narrative, build: Complexity) -> Vec<(IdeaDraft, Complexity)> {
    let label = &narrative.name;
    let direction = narrative.direction;
    let adjective = direction.adjective();
    let subjects: Vec<String> = narrative
        .top_members(2)
        .into_iter()
        .map(|m| m.signal.subject.clone())
        .collect();
    let cited = subjects.join(" and ");

    vec![
        (
            IdeaDraft {
                name: format!("{label} {adjective} tool"),
                description: format!(
                    "A product for the {} {label} narrative, building on activity around {cited}.",
                    direction.as_str().to_lowercase()
                ),
                target_user: None,
            },
            build,
        ),
        (
            IdeaDraft {
                name: format!("{label} signal dashboard"),
                description: format!(
                    "Aggregate {label} activity across sources so users can follow \
                     {cited} in one place."
                ),
                target_user: None,
            },
            Complexity::Days,
        ),
        (
            IdeaDraft {
                name: format!("{label} alert bot"),
                description: format!(
                    "Notify subscribers when new {label} signals cross the significance threshold."
                ),
                target_user: None,
            },
            Complexity::Hours,
        ),
        (
            IdeaDraft {
                name: format!("{label} integration SDK"),
                description: format!(
                    "Developer kit that makes it easy to integrate with {cited} and \
                     similar projects."
                ),
                target_user: Some("Application developers".into()),
            },
            build.max(Complexity::Weeks),
        ),
    ]
}
