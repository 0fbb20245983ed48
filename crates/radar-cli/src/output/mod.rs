pub mod format;

use serde::Serialize;

/// How command results are printed on stdout.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Aligned plain text for terminals
    Text,
    /// Pretty-printed JSON, same shape as the report file
    Json,
    /// Markdown suitable for a digest or PR comment
    Markdown,
}

/// Pretty-printed JSON, empty on failure.
pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}
