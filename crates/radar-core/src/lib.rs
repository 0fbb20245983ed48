//! Shared types for the narrative radar: signals, narratives, ideas, reports,
//! the layered configuration surface and the rolling run history.

pub mod config;
pub mod error;
pub mod history;
pub mod model;

pub use config::RadarConfig;
pub use error::CoreError;
