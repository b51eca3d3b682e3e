//! Chat-completion provider client
//!
//! Uniform call contract over backend models: one HTTP POST to a
//! chat-completions endpoint per attempt, `ProviderError` on transport
//! failure, non-success status or a malformed body. The `ChatProvider`
//! trait is the seam that lets the fallback ladder be tested offline.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Request to {model} failed: {message}")]
    Request { model: String, message: String },

    #[error("Provider returned status {status} for {model}: {detail}")]
    Status {
        model: String,
        status: u16,
        detail: String,
    },

    #[error("Malformed response from {model}: {message}")]
    MalformedResponse { model: String, message: String },

    #[error("Missing API credential: environment variable {env_var} is not set")]
    MissingCredential { env_var: String },
}

/// One chat message in a completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Uniform chat-completion call over interchangeable backend models.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Call one model with the given messages, returning its raw text.
    async fn call(
        &self,
        model: &str,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, ProviderError>;
}

// ── wire types ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

/// OpenRouter-style chat-completions client.
///
/// All configured model ids share one endpoint and one bearer credential;
/// the per-call timeout is the only cancellation primitive in the pipeline.
pub struct OpenRouterClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    temperature: f32,
}

impl OpenRouterClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Request {
                model: String::new(),
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            temperature,
        })
    }

    /// Read the bearer credential from the named environment variable.
    ///
    /// A missing credential is fatal at startup, not at call time.
    pub fn from_env(
        endpoint: &str,
        api_key_env: &str,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let api_key =
            std::env::var(api_key_env).map_err(|_| ProviderError::MissingCredential {
                env_var: api_key_env.to_string(),
            })?;
        Self::new(endpoint, api_key, temperature, timeout)
    }
}

#[async_trait]
impl ChatProvider for OpenRouterClient {
    async fn call(
        &self,
        model: &str,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, ProviderError> {
        let request = CompletionRequest {
            model,
            messages,
            max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("X-Title", "MediBot")
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Request {
                model: model.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                model: model.to_string(),
                status: status.as_u16(),
                detail,
            });
        }

        let body: CompletionResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::MalformedResponse {
                    model: model.to_string(),
                    message: e.to_string(),
                })?;

        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::MalformedResponse {
                model: model.to_string(),
                message: "response has no choices".to_string(),
            })?;

        Ok(content.trim().to_string())
    }
}
