//! HTTP request and response bodies.

use serde::{Deserialize, Serialize};

use crate::catalog::ModelCatalogEntry;
use crate::dispatcher::{ChatResult, CompletionStatus, DirectResult};
use crate::prompt::Message;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Friendly model name, e.g. "DeepSeek"
    pub model: String,
    #[serde(default)]
    pub history: Vec<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub model_used: String,
    pub response: String,
    pub status: CompletionStatus,
    pub tokens_used: Option<u32>,
    pub fallback_used: bool,
}

impl From<ChatResult> for ChatResponse {
    fn from(result: ChatResult) -> Self {
        Self {
            model_used: result.model_used,
            response: result.response_text,
            status: result.status,
            tokens_used: result.token_count,
            fallback_used: result.fallback_used,
        }
    }
}

/// Legacy `/generate` body. `model` is a raw provider model id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub model_used: String,
    pub response: String,
    pub status: CompletionStatus,
}

impl From<DirectResult> for GenerateResponse {
    fn from(result: DirectResult) -> Self {
        Self {
            model_used: result.model_used,
            response: result.response_text,
            status: result.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub description: String,
    pub provider: String,
}

impl From<&ModelCatalogEntry> for ModelInfo {
    fn from(entry: &ModelCatalogEntry) -> Self {
        Self {
            name: entry.friendly_name.clone(),
            description: entry.description.clone(),
            provider: entry.provider.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
}
