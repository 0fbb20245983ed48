use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod output;

#[derive(Parser)]
#[command(
    name = "radar",
    version,
    about = "Score ecosystem activity signals and surface emerging narratives"
)]
struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: output::OutputFormat,

    /// Extra config file layered over radar.toml and the user config
    #[arg(long, global = true, env = "RADAR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: commands::Commands,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = cli.config.as_deref();

    match &cli.command {
        commands::Commands::Run(args) => commands::run::run(args, config, cli.format),
        commands::Commands::Score(args) => commands::score::run(args, config, cli.format),
        commands::Commands::History(args) => commands::history::run(args, config, cli.format),
        commands::Commands::Config(args) => commands::config::run(args, config, cli.format),
        commands::Commands::Version => commands::version::run(),
    }
}
