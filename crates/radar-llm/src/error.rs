use radar_engine::ClusteringError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("No API key configured")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Unexpected response: {0}")]
    Response(String),
}

impl From<LlmError> for ClusteringError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::MissingApiKey => ClusteringError::Unavailable(e.to_string()),
            LlmError::Http(inner) if inner.is_timeout() => {
                ClusteringError::Transport(format!("request timed out: {inner}"))
            }
            LlmError::Http(inner) => ClusteringError::Transport(inner.to_string()),
            LlmError::Api { status, .. } if status == 429 || status >= 500 => {
                ClusteringError::Unavailable(e.to_string())
            }
            LlmError::Api { .. } => ClusteringError::Transport(e.to_string()),
            LlmError::Response(msg) => ClusteringError::Malformed(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        assert!(matches!(
            ClusteringError::from(LlmError::MissingApiKey),
            ClusteringError::Unavailable(_)
        ));
        assert!(matches!(
            ClusteringError::from(LlmError::Api {
                status: 529,
                body: "overloaded".into()
            }),
            ClusteringError::Unavailable(_)
        ));
        assert!(matches!(
            ClusteringError::from(LlmError::Api {
                status: 400,
                body: "bad".into()
            }),
            ClusteringError::Transport(_)
        ));
        assert!(matches!(
            ClusteringError::from(LlmError::Response("empty".into())),
            ClusteringError::Malformed(_)
        ));
    }
}
