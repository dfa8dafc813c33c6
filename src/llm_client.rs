//! LLM Client for the completion provider
//!
//! Talks to an OpenAI-compatible `/chat/completions` endpoint (OpenRouter by
//! default). One client is built at startup and shared by all requests.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::prompt::Message;

pub const DEFAULT_API_BASE: &str = "https://openrouter.ai/api/v1";
pub const ATTRIBUTION_REFERER: &str = "https://mindmentor.ai";
pub const ATTRIBUTION_TITLE: &str = "MindMentor";

/// LLM configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_base: String,
    /// Sent as a bearer token; an empty key is left for the provider to reject
    pub api_key: String,
    pub timeout_secs: u64,
    pub referer: String,
    pub title: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: String::new(),
            timeout_secs: 120,
            referer: ATTRIBUTION_REFERER.to_string(),
            title: ATTRIBUTION_TITLE.to_string(),
        }
    }
}

/// Sampling parameters for one call. `None` leaves the provider default.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompletionParams {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// A successful completion
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub total_tokens: Option<u32>,
}

/// Anything that can turn a message list into a completion for a model id.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        messages: &[Message],
        params: CompletionParams,
    ) -> Result<Completion>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
    code: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiError,
}

impl ApiError {
    fn describe(&self) -> String {
        let message = self.message.as_deref().unwrap_or("Unknown error");
        match &self.code {
            Some(code) => format!("{} (code {})", message, code),
            None => message.to_string(),
        }
    }
}

/// Render a non-2xx provider response, preferring the JSON error message.
fn describe_http_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => format!(
            "Error code: {} - {}",
            status.as_u16(),
            envelope.error.describe()
        ),
        Err(_) => format!("Error code: {} - {}", status.as_u16(), body.trim()),
    }
}

/// LLM client
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        info!("LLM client: base={}", config.api_base);
        Ok(Self { client, config })
    }

    pub fn api_base(&self) -> &str {
        &self.config.api_base
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionProvider for LlmClient {
    async fn complete(
        &self,
        model: &str,
        messages: &[Message],
        params: CompletionParams,
    ) -> Result<Completion> {
        debug!("Calling LLM: model={} messages={}", model, messages.len());

        let resp = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", &self.config.referer)
            .header("X-Title", &self.config.title)
            .json(&ChatRequest {
                model,
                messages,
                temperature: params.temperature,
                max_tokens: params.max_tokens,
            })
            .send()
            .await
            .context("LLM request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("{}", describe_http_error(status, &body));
        }

        let chat: ChatResponse = resp.json().await.context("Invalid LLM response")?;

        // OpenRouter can report upstream failures inside a 200 body
        if let Some(err) = chat.error {
            bail!("{}", err.describe());
        }

        let choice = chat
            .choices
            .into_iter()
            .next()
            .context("No choices in LLM response")?;

        let completion = Completion {
            content: choice.message.content.unwrap_or_default(),
            total_tokens: chat.usage.and_then(|u| u.total_tokens),
        };

        debug!(
            "LLM response: model={} chars={} tokens={:?}",
            model,
            completion.content.len(),
            completion.total_tokens
        );
        Ok(completion)
    }
}
