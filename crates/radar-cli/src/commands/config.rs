use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use crate::output::OutputFormat;

#[derive(Args)]
pub struct ConfigArgs {
    /// Only validate; print nothing but the verdict
    #[arg(long)]
    pub check: bool,
}

pub fn run(args: &ConfigArgs, config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let mut config = super::load_config(config_path)?;

    if args.check {
        println!("Configuration OK");
        return Ok(());
    }

    if config.llm.api_key.is_some() {
        config.llm.api_key = Some("********".into());
    }
    let value = serde_json::to_value(&config).context("Failed to serialize configuration")?;
    let json = serde_json::to_string_pretty(&value).context("Failed to serialize configuration")?;
    match format {
        OutputFormat::Json => println!("{json}"),
        OutputFormat::Text => print!("{}", format_sections(&value)),
        OutputFormat::Markdown => {
            println!("## Effective configuration\n");
            println!("```json\n{json}\n```");
        }
    }
    Ok(())
}

/// One `[section]` block per top-level table, `key = value` lines beneath.
/// Unset options are omitted.
fn format_sections(config: &Value) -> String {
    let mut out = String::new();
    let Some(sections) = config.as_object() else {
        return out;
    };
    for (name, section) in sections {
        let _ = writeln!(out, "[{name}]");
        match section.as_object() {
            Some(fields) => {
                for (key, value) in fields.iter().filter(|(_, v)| !v.is_null()) {
                    let _ = writeln!(out, "{key} = {value}");
                }
            }
            None => {
                let _ = writeln!(out, "value = {section}");
            }
        }
        out.push('\n');
    }
    out
}
