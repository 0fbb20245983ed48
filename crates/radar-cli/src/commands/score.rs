use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use radar_engine::{gate, Engine};
use radar_ingest::{load_batches, normalize};

use crate::output::format::format_scores;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct ScoreArgs {
    /// Batch files to score
    #[arg(required = true)]
    pub batches: Vec<PathBuf>,

    /// History file used for novelty and velocity baselines
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Show only signals that pass the significance gate
    #[arg(long)]
    pub passing: bool,
}

pub fn run(args: &ScoreArgs, config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let config = super::load_config(config_path)?;
    let batch = load_batches(&args.batches).context("Failed to read batch files")?;
    let history = super::history_store(args.history.as_deref(), &config)?
        .load()
        .context("Failed to read history")?;

    let normalized = normalize(&batch.records);
    let rejected = batch.malformed + normalized.rejected;
    if rejected > 0 {
        eprintln!("{rejected} of {} records rejected", batch.len());
    }

    let engine = Engine::new(config).context("Invalid configuration")?;
    let threshold = engine.config().gate.threshold;
    let mut scored = engine.score(&normalized.signals, &history);
    if args.passing {
        scored = gate::apply(scored, threshold).passed;
    }
    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.signal.id.cmp(&b.signal.id))
    });

    println!("{}", format_scores(&scored, threshold, format));
    Ok(())
}
