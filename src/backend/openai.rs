//! OpenAI-compatible chat-completions backend.
//!
//! Instruction turns are sent as `system` messages and the request turn as a
//! `user` message. Works with any server exposing `POST {endpoint}/chat/completions`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::backend::{BackendError, GenerationBackend, Turn, TurnRole};
use crate::config::validation::check_url;
use crate::config::{ConfigError, MockServerConfig};
use crate::resilience::classify_status;

/// Backend client for the chat-completions protocol.
#[derive(Clone)]
pub struct OpenAiBackend {
    client: reqwest::Client,
    completions_url: Url,
    api_key: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl OpenAiBackend {
    /// Build a client from config. Fails fast on a missing credential or bad endpoint.
    pub fn from_config(config: &MockServerConfig) -> Result<Self, ConfigError> {
        let api_key = config.require_api_key()?.to_string();
        let endpoint = check_url("endpoint", config.effective_endpoint())?;
        Self::new(endpoint, api_key)
    }

    pub fn new(endpoint: Url, api_key: impl Into<String>) -> Result<Self, ConfigError> {
        let completions_url = completions_url(&endpoint).ok_or_else(|| ConfigError::InvalidUrl {
            field: "endpoint",
            value: endpoint.to_string(),
        })?;

        // Deadlines are enforced per attempt by the request handler.
        let client = reqwest::Client::builder()
            .user_agent(concat!("ai-mock-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            completions_url,
            api_key: api_key.into(),
        })
    }

    pub fn completions_url(&self) -> &Url {
        &self.completions_url
    }
}

fn completions_url(endpoint: &Url) -> Option<Url> {
    let base = endpoint.as_str().trim_end_matches('/');
    Url::parse(&format!("{}/chat/completions", base)).ok()
}

#[async_trait]
impl GenerationBackend for OpenAiBackend {
    async fn generate(&self, turns: &[Turn], model: &str) -> Result<String, BackendError> {
        let body = ChatRequest {
            model,
            messages: turns
                .iter()
                .map(|turn| ChatMessage {
                    role: match turn.role {
                        TurnRole::Instruction => "system",
                        TurnRole::Request => "user",
                    },
                    content: &turn.content,
                })
                .collect(),
        };

        let response = self
            .client
            .post(self.completions_url.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::debug!(status = %status, "Backend returned error status");
            return Err(classify_status(status.as_u16(), truncate(&message, 200)));
        }

        let parsed: ChatResponse = response.json().await.map_err(transport_error)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(BackendError::EmptyContent)
    }
}

fn transport_error(err: reqwest::Error) -> BackendError {
    BackendError::Transport(err.to_string())
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

impl std::fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field("completions_url", &self.completions_url.as_str())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completions_url() {
        let url = completions_url(&Url::parse("https://api.openai.com/v1").unwrap()).unwrap();
        assert_eq!(url.as_str(), "https://api.openai.com/v1/chat/completions");

        let url = completions_url(&Url::parse("http://localhost:11434/v1/").unwrap()).unwrap();
        assert_eq!(url.as_str(), "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn test_from_config_requires_credential() {
        let err = OpenAiBackend::from_config(&MockServerConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential));

        let backend = OpenAiBackend::from_config(&MockServerConfig::new("sk-test")).unwrap();
        assert!(backend.completions_url().as_str().ends_with("/chat/completions"));
    }

    #[test]
    fn test_request_serialization() {
        let body = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![
                ChatMessage { role: "system", content: "be json" },
                ChatMessage { role: "user", content: "GET /" },
            ],
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "GET /");
    }

    #[test]
    fn test_debug_hides_key() {
        let backend = OpenAiBackend::from_config(&MockServerConfig::new("sk-secret")).unwrap();
        assert!(!format!("{:?}", backend).contains("sk-secret"));
    }
}
