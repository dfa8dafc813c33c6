//! MindMentor API
//!
//! A small relay between the MindMentor web client and an OpenAI-compatible
//! LLM aggregator. Each chat request is wrapped with the tutoring system
//! prompt and sent to the requested model, falling back through the rest of
//! the model catalog until one answers.
//!
//! ## Module Structure
//! - `catalog`: ordered model catalog and candidate ordering
//! - `prompt`: system prompt and message assembly
//! - `llm_client`: provider client and the `CompletionProvider` seam
//! - `dispatcher`: fallback chat and legacy direct generation
//! - `server`: axum routes and startup
//! - `config`: CLI/env configuration

pub mod catalog;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod llm_client;
pub mod prompt;
pub mod server;
pub mod types;

pub use catalog::{ModelCatalog, ModelCatalogEntry};
pub use config::ServerConfig;
pub use dispatcher::{
    chat_with_fallback, generate_direct, ChatResult, CompletionStatus, DirectResult,
};
pub use error::{ErrorBody, RelayError};
pub use llm_client::{Completion, CompletionParams, CompletionProvider, LlmClient, LlmConfig};
pub use prompt::{assemble_messages, Message, Role, SYSTEM_PROMPT};
pub use server::{cors_layer, router, run_server, AppState};
