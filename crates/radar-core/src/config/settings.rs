use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

const ENV_PREFIX: &str = "RADAR_";
const PROJECT_CONFIG: &str = "radar.toml";

/// Composite-score weights. Must sum to 1.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Weights {
    pub velocity: f64,
    pub convergence: f64,
    pub novelty: f64,
    pub authority: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            velocity: 0.30,
            convergence: 0.40,
            novelty: 0.20,
            authority: 0.10,
        }
    }
}

impl Weights {
    pub fn sum(&self) -> f64 {
        self.velocity + self.convergence + self.novelty + self.authority
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GateConfig {
    /// Signals scoring strictly below this are dropped.
    pub threshold: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self { threshold: 40.0 }
    }
}

/// Cutoffs for narrative confidence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConfidenceConfig {
    pub high_min_score: f64,
    pub high_min_members: usize,
    pub high_min_sources: usize,
    pub medium_min_score: f64,
    pub medium_min_sources: usize,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            high_min_score: 70.0,
            high_min_members: 3,
            high_min_sources: 2,
            medium_min_score: 50.0,
            medium_min_sources: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NoveltyConfig {
    /// Multiplier applied per prior run that surfaced the same subject.
    pub subject_decay: f64,
    /// Multiplier applied per prior run that surfaced one of its topics only.
    pub topic_decay: f64,
}

impl Default for NoveltyConfig {
    fn default() -> Self {
        Self {
            subject_decay: 0.5,
            topic_decay: 0.85,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VelocityConfig {
    /// Score for subjects with no baseline.
    pub neutral: f64,
    /// Growth is expressed per this many days.
    pub reference_window_days: f64,
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self {
            neutral: 50.0,
            reference_window_days: 7.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuthorityConfig {
    pub baseline: f64,
    pub hinted: f64,
    pub verified: f64,
    pub hinted_and_verified: f64,
    /// Subjects known to be credible regardless of the record's own hint.
    pub verified_subjects: Vec<String>,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            baseline: 25.0,
            hinted: 80.0,
            verified: 70.0,
            hinted_and_verified: 100.0,
            verified_subjects: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Topic groups smaller than this dissolve into "Other".
    pub min_group_size: usize,
    /// Upper bound on topic narratives from the rule-based strategy.
    pub max_narratives: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            min_group_size: 2,
            max_narratives: 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IdeasConfig {
    pub max_per_narrative: usize,
}

impl Default for IdeasConfig {
    fn default() -> Self {
        Self {
            max_per_narrative: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub enabled: bool,
    pub api_url: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    /// Batches larger than this skip the LLM strategy.
    pub max_signals: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: "https://api.anthropic.com/v1/messages".into(),
            model: "claude-sonnet-4-20250514".into(),
            api_key: None,
            timeout_secs: 20,
            max_tokens: 4000,
            max_signals: 200,
        }
    }
}

impl LlmConfig {
    pub fn is_configured(&self) -> bool {
        self.enabled && self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HistoryConfig {
    /// How many of the most recent runs feed novelty and direction.
    pub window: usize,
    /// How many runs the history file keeps.
    pub retain_runs: usize,
    /// Velocity deltas within this band count as flat.
    pub flat_tolerance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            window: 1,
            retain_runs: 20,
            flat_tolerance: 2.0,
            path: None,
        }
    }
}

/// Every externally overridable knob of the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RadarConfig {
    pub weights: Weights,
    pub gate: GateConfig,
    pub confidence: ConfidenceConfig,
    pub novelty: NoveltyConfig,
    pub velocity: VelocityConfig,
    pub authority: AuthorityConfig,
    pub clustering: ClusteringConfig,
    pub ideas: IdeasConfig,
    pub llm: LlmConfig,
    pub history: HistoryConfig,
}

impl RadarConfig {
    /// Load and validate configuration.
    ///
    /// Precedence (highest to lowest):
    /// 1. Environment variables (`RADAR_*`, `__` separates sections)
    /// 2. The explicit file, if given
    /// 3. `radar.toml` in the current directory
    /// 4. `~/.config/radar/config.toml`
    /// 5. Built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self, CoreError> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(CoreError::Config(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
        }
        let mut config: Self = Self::figment(explicit).extract()?;
        if config.llm.api_key.is_none() {
            config.llm.api_key = std::env::var("ANTHROPIC_API_KEY")
                .ok()
                .filter(|k| !k.is_empty());
        }
        config.validate()?;
        Ok(config)
    }

    pub fn figment(explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global) = Self::global_config_path() {
            if global.exists() {
                figment = figment.merge(Toml::file(global));
            }
        }

        let local = PathBuf::from(PROJECT_CONFIG);
        if local.exists() {
            figment = figment.merge(Toml::file(local));
        }

        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("radar").join("config.toml"))
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), CoreError> {
        let w = &self.weights;
        for (name, value) in [
            ("velocity", w.velocity),
            ("convergence", w.convergence),
            ("novelty", w.novelty),
            ("authority", w.authority),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(
                    &format!("weights.{name}"),
                    format!("must be a non-negative number, got {value}"),
                ));
            }
        }
        if (w.sum() - 1.0).abs() > 1e-6 {
            return Err(invalid(
                "weights",
                format!("must sum to 1.0, got {:.4}", w.sum()),
            ));
        }

        check_percent("gate.threshold", self.gate.threshold)?;
        check_percent("confidence.high_min_score", self.confidence.high_min_score)?;
        check_percent(
            "confidence.medium_min_score",
            self.confidence.medium_min_score,
        )?;
        if self.confidence.medium_min_score > self.confidence.high_min_score {
            return Err(invalid(
                "confidence.medium_min_score",
                "must not exceed confidence.high_min_score".into(),
            ));
        }

        for (name, value) in [
            ("authority.baseline", self.authority.baseline),
            ("authority.hinted", self.authority.hinted),
            ("authority.verified", self.authority.verified),
            (
                "authority.hinted_and_verified",
                self.authority.hinted_and_verified,
            ),
            ("velocity.neutral", self.velocity.neutral),
        ] {
            check_percent(name, value)?;
        }
        let window = self.velocity.reference_window_days;
        if window.is_nan() || window <= 0.0 {
            return Err(invalid(
                "velocity.reference_window_days",
                "must be positive".into(),
            ));
        }

        for (name, value) in [
            ("novelty.subject_decay", self.novelty.subject_decay),
            ("novelty.topic_decay", self.novelty.topic_decay),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(invalid(name, format!("must be in (0, 1], got {value}")));
            }
        }

        if self.clustering.max_narratives == 0 {
            return Err(invalid("clustering.max_narratives", "must be at least 1".into()));
        }
        if !(1..=5).contains(&self.ideas.max_per_narrative) {
            return Err(invalid(
                "ideas.max_per_narrative",
                format!("must be between 1 and 5, got {}", self.ideas.max_per_narrative),
            ));
        }
        if self.llm.timeout_secs == 0 {
            return Err(invalid("llm.timeout_secs", "must be positive".into()));
        }
        if self.history.window == 0 {
            return Err(invalid("history.window", "must be at least 1".into()));
        }
        if self.history.retain_runs < self.history.window {
            return Err(invalid(
                "history.retain_runs",
                "must be at least history.window".into(),
            ));
        }
        if !self.history.flat_tolerance.is_finite() || self.history.flat_tolerance < 0.0 {
            return Err(invalid(
                "history.flat_tolerance",
                "must be a non-negative number".into(),
            ));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> CoreError {
    CoreError::Config(format!("invalid value for '{field}': {reason}"))
}

fn check_percent(field: &str, value: f64) -> Result<(), CoreError> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, format!("must be within [0, 100], got {value}")))
    }
}
