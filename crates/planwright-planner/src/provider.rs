//! The external completion-provider contract and implementations.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Options for a single completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionOptions {
    /// Cap on prompt/response size for this request.
    pub max_tokens: u32,

    /// Sampling temperature; planners want deterministic output.
    pub temperature: f32,

    /// Sequences at which the provider should stop generating.
    #[serde(default)]
    pub stop_sequences: Vec<String>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.0,
            stop_sequences: Vec::new(),
        }
    }
}

impl CompletionOptions {
    /// Override the token budget.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Errors surfaced by a completion provider.
///
/// Planners translate these into planning failures; they never leak to
/// the caller directly.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("http error: {0}")]
    Http(String),
    #[error("response error: {0}")]
    Response(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// An external text-completion provider.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Produce a completion for the prompt.
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, ProviderError>;
}

/// Configuration for [`OpenAiCompletionProvider`].
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Chat-completions endpoint (OpenAI-compatible, including Azure).
    pub endpoint: String,

    /// Bearer key credential.
    pub api_key: String,

    /// Model (or deployment) name.
    pub model: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Completion provider backed by an OpenAI-compatible chat endpoint.
pub struct OpenAiCompletionProvider {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiCompletionProvider {
    /// Create a provider from configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Http(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: String,
}

#[async_trait]
impl CompletionProvider for OpenAiCompletionProvider {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, ProviderError> {
        let body = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stop: options.stop_sequences.clone(),
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Response(format!("HTTP {status}: {text}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Serialization(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::Response("missing choices".to_string()))
    }
}

/// Provider that replays a fixed script of completions, in order.
///
/// Used in tests and examples where planner behavior must be
/// deterministic.
#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    /// Create a provider from scripted responses.
    pub fn new(responses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// The prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Number of completion calls made.
    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(
        &self,
        prompt: &str,
        _options: &CompletionOptions,
    ) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ProviderError::Response("script exhausted".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_provider_replays_in_order() {
        let provider = ScriptedProvider::new(["first", "second"]);
        let options = CompletionOptions::default();

        assert_eq!(provider.complete("a", &options).await.unwrap(), "first");
        assert_eq!(provider.complete("b", &options).await.unwrap(), "second");
        assert!(provider.complete("c", &options).await.is_err());
        assert_eq!(provider.prompts(), vec!["a", "b"]);
    }
}
