//! OpenAI-compatible chat completion backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{status_error, SourceError, TextGenerator};
use crate::config::LlmConfig;
use crate::utils::HttpClient;

/// One chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

/// Chat completions over the OpenAI REST API
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    client: HttpClient,
    base_url: String,
    model: String,
    api_key: String,
}

impl OpenAiBackend {
    /// Create a backend; fails when no API key is configured
    pub fn new(config: &LlmConfig) -> Result<Self, SourceError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| SourceError::Config("no API key configured for summaries".to_string()))?;

        Ok(Self {
            client: HttpClient::new()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiBackend {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, SourceError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
        };

        let response = self
            .client
            .client()
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Chat request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(status_error("Chat API", response.status()));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse JSON: {}", e)))?;

        json["choices"][0]["message"]["content"]
            .as_str()
            .map(|content| content.trim().to_string())
            .ok_or_else(|| SourceError::Parse("No content in chat response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn test_config(base_url: &str) -> LlmConfig {
        LlmConfig {
            base_url: base_url.to_string(),
            api_key: Some("test-key".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let config = LlmConfig {
            api_key: None,
            ..Default::default()
        };
        assert!(matches!(OpenAiBackend::new(&config), Err(SourceError::Config(_))));
    }

    #[tokio::test]
    async fn test_complete() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-4.1-mini",
                "messages": [
                    {"role": "system", "content": "Be brief."},
                    {"role": "user", "content": "Summarize."}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"choices": [{"message": {"role": "assistant", "content": "  A short bio.\n"}}]})
                    .to_string(),
            )
            .create_async()
            .await;

        let backend = OpenAiBackend::new(&test_config(&server.url())).unwrap();
        let reply = backend.complete("Be brief.", "Summarize.").await.unwrap();

        mock.assert_async().await;
        assert_eq!(reply, "A short bio.");
    }

    #[tokio::test]
    async fn test_complete_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .create_async()
            .await;

        let backend = OpenAiBackend::new(&test_config(&server.url())).unwrap();
        assert!(matches!(
            backend.complete("s", "u").await,
            Err(SourceError::Api(_))
        ));
    }

    #[tokio::test]
    async fn test_complete_without_content() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"choices": []}).to_string())
            .create_async()
            .await;

        let backend = OpenAiBackend::new(&test_config(&server.url())).unwrap();
        assert!(matches!(
            backend.complete("s", "u").await,
            Err(SourceError::Parse(_))
        ));
    }
}
