use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("{record}: missing required field `{field}`")]
    MissingField { record: String, field: &'static str },

    #[error("{record}: invalid magnitude {value}")]
    InvalidMagnitude { record: String, value: f64 },

    #[error("{record}: unparseable timestamp `{value}`")]
    InvalidTimestamp { record: String, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Batch error: {0}")]
    Batch(String),
}
