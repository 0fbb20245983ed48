mod settings;

pub use settings::{
    AuthorityConfig, ClusteringConfig, ConfidenceConfig, GateConfig, HistoryConfig, IdeasConfig,
    LlmConfig, NoveltyConfig, RadarConfig, VelocityConfig, Weights,
};
