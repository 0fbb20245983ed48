use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use crate::output::format::format_history;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct HistoryArgs {
    /// History file (default: history.path, then the platform data dir)
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Show at most this many runs, most recent first
    #[arg(short = 'n', long, default_value = "10")]
    pub limit: usize,
}

pub fn run(args: &HistoryArgs, config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let config = super::load_config(config_path)?;
    let store = super::history_store(args.history.as_deref(), &config)?;
    let snapshot = store
        .load()
        .with_context(|| format!("Failed to read history at {}", store.path().display()))?;

    let recent: Vec<_> = snapshot.runs.iter().rev().take(args.limit).collect();
    println!("{}", format_history(&recent, format));
    Ok(())
}
