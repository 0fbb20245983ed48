use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use radar_core::config::LlmConfig;
use radar_engine::{ClusteringError, LlmBackend};

use crate::error::LlmError;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

/// Anthropic Messages API client used as the clustering backend.
pub struct AnthropicBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicBackend {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or(LlmError::MissingApiKey)?;
        // Socket-level guard only; the engine enforces the clustering deadline.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.saturating_mul(2)))
            .build()?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, prompt: &str) -> Result<String, LlmError> {
        let body = request_body(&self.model, self.max_tokens, prompt);
        let resp = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api { status, body });
        }

        let text = resp.text().await?;
        response_text(&text)
    }
}

#[async_trait]
impl LlmBackend for AnthropicBackend {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, ClusteringError> {
        tracing::debug!("Sending {} byte prompt to {}", prompt.len(), self.api_url);
        Ok(self.send(prompt).await?)
    }
}

fn request_body<'a>(model: &'a str, max_tokens: u32, prompt: &'a str) -> MessagesRequest<'a> {
    MessagesRequest {
        model,
        max_tokens,
        temperature: 0.0,
        messages: vec![Message {
            role: "user",
            content: prompt,
        }],
    }
}

/// Concatenated text blocks of a Messages API response.
fn response_text(raw: &str) -> Result<String, LlmError> {
    let resp: MessagesResponse = serde_json::from_str(raw)
        .map_err(|e| LlmError::Response(format!("could not parse response: {e}")))?;
    let text: String = resp
        .content
        .into_iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Other => None,
        })
        .collect::<Vec<_>>()
        .join("\n");
    if text.trim().is_empty() {
        return Err(LlmError::Response("response has no text content".into()));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = request_body("claude-test", 1000, "group these");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "claude-test");
        assert_eq!(json["max_tokens"], 1000);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "group these");
    }

    #[test]
    fn test_response_text_joins_text_blocks() {
        let raw = r#"{"id": "msg_1", "content": [
            {"type": "text", "text": "{\"narratives\": []"},
            {"type": "tool_use", "id": "t", "name": "x", "input": {}},
            {"type": "text", "text": "}"}
        ]}"#;
        assert_eq!(response_text(raw).unwrap(), "{\"narratives\": []\n}");
    }

    #[test]
    fn test_response_without_text_is_error() {
        assert!(matches!(
            response_text(r#"{"content": []}"#),
            Err(LlmError::Response(_))
        ));
        assert!(matches!(response_text("<html>"), Err(LlmError::Response(_))));
    }

    #[test]
    fn test_missing_key_is_rejected() {
        let config = LlmConfig::default();
        assert!(matches!(
            AnthropicBackend::from_config(&config),
            Err(LlmError::MissingApiKey)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_maps_to_clustering_error() {
        let config = LlmConfig {
            api_key: Some("sk-test".into()),
            api_url: "http://127.0.0.1:9/v1/messages".into(),
            timeout_secs: 1,
            ..LlmConfig::default()
        };
        let backend = AnthropicBackend::from_config(&config).unwrap();
        assert_eq!(backend.name(), backend.model());
        let err = backend.complete("hello").await.unwrap_err();
        assert!(matches!(
            err,
            ClusteringError::Transport(_) | ClusteringError::Unavailable(_)
        ));
    }
}
