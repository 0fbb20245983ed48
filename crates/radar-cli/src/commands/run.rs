use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use radar_engine::{Engine, RecordedRun};
use radar_ingest::load_batches;
use radar_llm::AnthropicBackend;

use crate::output::format::format_report;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct RunArgs {
    /// Batch files: a JSON array of records or an object with a `records` array
    #[arg(required = true)]
    pub batches: Vec<PathBuf>,

    /// History file (default: history.path, then the platform data dir)
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Also write the report as JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Cluster rule-based only, even when an API key is configured
    #[arg(long)]
    pub no_llm: bool,

    /// Read history but do not record this run
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(args: &RunArgs, config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let mut config = super::load_config(config_path)?;
    if args.no_llm {
        config.llm.enabled = false;
    }

    let batch = load_batches(&args.batches).context("Failed to read batch files")?;
    let store = super::history_store(args.history.as_deref(), &config)?;

    // Held until the run is recorded.
    let _guard = if args.dry_run {
        None
    } else {
        Some(store.lock_run().with_context(|| {
            format!("Failed to lock history at {}", store.path().display())
        })?)
    };
    let history = store
        .load()
        .with_context(|| format!("Failed to read history at {}", store.path().display()))?;

    let mut engine = Engine::new(config.clone()).context("Invalid configuration")?;
    if config.llm.is_configured() {
        match AnthropicBackend::from_config(&config.llm) {
            Ok(backend) => engine = engine.with_backend(Arc::new(backend)),
            Err(e) => tracing::warn!("LLM backend unavailable, clustering rule-based: {e}"),
        }
    } else {
        tracing::info!("No LLM configured; clustering rule-based");
    }

    let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
    let RecordedRun { report, record } = rt
        .block_on(engine.run_recorded(&batch, &history))
        .context("Radar run failed")?;

    if !args.dry_run {
        store.append(record).context("Failed to record run history")?;
        tracing::info!("Recorded run {} in {}", report.run_id, store.path().display());
    }

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
    }

    println!("{}", format_report(&report, format));
    Ok(())
}
