use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Config source error: {0}")]
    Figment(#[from] figment::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("History error: {0}")]
    History(String),
}
