pub mod config;
pub mod history;
pub mod run;
pub mod score;
pub mod version;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use radar_core::history::HistoryStore;
use radar_core::RadarConfig;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline over one or more batch files
    Run(run::RunArgs),
    /// Score a batch and show which signals pass the gate
    Score(score::ScoreArgs),
    /// List recorded runs
    History(history::HistoryArgs),
    /// Show or check the effective configuration
    Config(config::ConfigArgs),
    /// Print version information
    Version,
}

pub(crate) fn load_config(path: Option<&Path>) -> Result<RadarConfig> {
    RadarConfig::load(path).context("Failed to load configuration")
}

/// `--history`, then `history.path`, then the platform data dir.
pub(crate) fn history_store(explicit: Option<&Path>, config: &RadarConfig) -> Result<HistoryStore> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| config.history.path.clone())
        .or_else(HistoryStore::default_path)
        .context("No history location: pass --history or set history.path")?;
    Ok(HistoryStore::new(path, config.history.retain_runs))
}
