//! Fallback Dispatcher
//!
//! Sends an assembled conversation to the provider, walking the candidate
//! list until one model answers. Attempts are strictly sequential with no
//! backoff; only total exhaustion reaches the caller.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::catalog::ModelCatalog;
use crate::error::RelayError;
use crate::llm_client::{CompletionParams, CompletionProvider};
use crate::prompt::{Message, SYSTEM_PROMPT};

pub const CHAT_TEMPERATURE: f32 = 0.7;
pub const CHAT_MAX_TOKENS: u32 = 1000;

/// Parameters used for every fallback-chain call
pub const CHAT_PARAMS: CompletionParams = CompletionParams {
    temperature: Some(CHAT_TEMPERATURE),
    max_tokens: Some(CHAT_MAX_TOKENS),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionStatus {
    Success,
}

/// Outcome of a successful fallback chat
#[derive(Debug, Clone, PartialEq)]
pub struct ChatResult {
    /// Friendly name of the model that actually answered
    pub model_used: String,
    pub response_text: String,
    pub status: CompletionStatus,
    pub token_count: Option<u32>,
    /// True when the answering model was not the first candidate
    pub fallback_used: bool,
}

/// Outcome of a legacy single-model call
#[derive(Debug, Clone, PartialEq)]
pub struct DirectResult {
    pub model_used: String,
    pub response_text: String,
    pub status: CompletionStatus,
}

/// Try each candidate for `requested_model` until one succeeds.
///
/// Per-candidate errors are logged and absorbed. If all fail the result is
/// `ServiceExhausted` carrying the last error message.
pub async fn chat_with_fallback(
    provider: &dyn CompletionProvider,
    catalog: &ModelCatalog,
    messages: &[Message],
    requested_model: &str,
) -> Result<ChatResult, RelayError> {
    let candidates = catalog.candidates(requested_model);
    if catalog.resolve(requested_model).is_none() {
        warn!(
            "Unknown model '{}', defaulting to {}",
            requested_model,
            catalog.default_entry().friendly_name
        );
    }

    let mut last_failure: Option<RelayError> = None;

    for (index, model_id) in candidates.iter().enumerate() {
        match provider.complete(model_id, messages, CHAT_PARAMS).await {
            Ok(completion) => {
                let model_used = catalog
                    .friendly_name_for(model_id)
                    .unwrap_or(requested_model)
                    .to_string();
                let fallback_used = index != 0;

                if fallback_used {
                    info!(
                        "Served by fallback model {} after {} failed attempt(s)",
                        model_used, index
                    );
                } else {
                    info!("Served by requested model {}", model_used);
                }

                return Ok(ChatResult {
                    model_used,
                    response_text: completion.content,
                    status: CompletionStatus::Success,
                    token_count: completion.total_tokens,
                    fallback_used,
                });
            }
            Err(e) => {
                let failure = RelayError::CandidateFailure {
                    model: model_id.to_string(),
                    message: format!("{:#}", e),
                };
                warn!("{}", failure);
                last_failure = Some(failure);
            }
        }
    }

    let last_error = match last_failure {
        Some(RelayError::CandidateFailure { message, .. }) => message,
        Some(other) => other.to_string(),
        None => "no candidate models configured".to_string(),
    };
    error!(
        "All {} model(s) failed, last error: {}",
        candidates.len(),
        last_error
    );

    Err(RelayError::ServiceExhausted {
        attempts: candidates.len(),
        last_error,
    })
}

/// Legacy single call: raw provider model id, system prompt only, no fallback.
///
/// Provider parameters are left at their defaults and any error is returned
/// as-is.
pub async fn generate_direct(
    provider: &dyn CompletionProvider,
    model: &str,
    prompt: &str,
) -> Result<DirectResult, RelayError> {
    let messages = [Message::system(SYSTEM_PROMPT), Message::user(prompt)];

    match provider
        .complete(model, &messages, CompletionParams::default())
        .await
    {
        Ok(completion) => Ok(DirectResult {
            model_used: model.to_string(),
            response_text: completion.content,
            status: CompletionStatus::Success,
        }),
        Err(e) => {
            error!("Direct generation with {} failed: {:#}", model, e);
            Err(RelayError::DirectCallFailure(format!("{:#}", e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ModelCatalogEntry;
    use crate::llm_client::Completion;
    use crate::prompt::{assemble_messages, Role};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const DEEPSEEK: &str = "deepseek/deepseek-r1:free";
    const LLAMA: &str = "meta-llama/llama-3.3-70b-instruct:free";
    const MINIMAX: &str = "minimax/minimax-m2:free";

    /// Answers per model id from a fixed script and records every call.
    #[derive(Default)]
    struct ScriptedProvider {
        outcomes: HashMap<String, Result<Completion, String>>,
        calls: Mutex<Vec<(String, Vec<Message>, CompletionParams)>>,
    }

    impl ScriptedProvider {
        fn succeed(mut self, model: &str, content: &str, tokens: Option<u32>) -> Self {
            self.outcomes.insert(
                model.to_string(),
                Ok(Completion {
                    content: content.to_string(),
                    total_tokens: tokens,
                }),
            );
            self
        }

        fn fail(mut self, model: &str, message: &str) -> Self {
            self.outcomes
                .insert(model.to_string(), Err(message.to_string()));
            self
        }

        fn called_models(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|(m, _, _)| m.clone())
                .collect()
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(
            &self,
            model: &str,
            messages: &[Message],
            params: CompletionParams,
        ) -> anyhow::Result<Completion> {
            self.calls
                .lock()
                .unwrap()
                .push((model.to_string(), messages.to_vec(), params));
            match self.outcomes.get(model) {
                Some(Ok(c)) => Ok(c.clone()),
                Some(Err(e)) => Err(anyhow::anyhow!("{}", e)),
                None => Err(anyhow::anyhow!("model {} not scripted", model)),
            }
        }
    }

    /// Fails every call the way `LlmClient` reports a refused connection.
    struct UnreachableProvider;

    #[async_trait]
    impl CompletionProvider for UnreachableProvider {
        async fn complete(
            &self,
            _model: &str,
            _messages: &[Message],
            _params: CompletionParams,
        ) -> anyhow::Result<Completion> {
            use anyhow::Context;
            Err(anyhow::anyhow!("tcp connect error: Connection refused"))
                .context("LLM request failed")
        }
    }

    fn gravity() -> Vec<Message> {
        assemble_messages(SYSTEM_PROMPT, &[], "Explain gravity")
    }

    #[tokio::test]
    async fn test_first_candidate_success() {
        let provider = ScriptedProvider::default().succeed(DEEPSEEK, "Gravity is...", Some(42));
        let catalog = ModelCatalog::builtin();

        let result = chat_with_fallback(&provider, &catalog, &gravity(), "DeepSeek")
            .await
            .unwrap();

        assert_eq!(result.model_used, "DeepSeek");
        assert_eq!(result.response_text, "Gravity is...");
        assert_eq!(result.status, CompletionStatus::Success);
        assert_eq!(result.token_count, Some(42));
        assert!(!result.fallback_used);
        assert_eq!(provider.called_models(), vec![DEEPSEEK]);
    }

    #[tokio::test]
    async fn test_fallback_to_second_candidate() {
        let provider = ScriptedProvider::default()
            .fail(DEEPSEEK, "Error code: 429 - rate limited")
            .succeed(LLAMA, "Gravity attracts masses.", None);
        let catalog = ModelCatalog::builtin();

        let result = chat_with_fallback(&provider, &catalog, &gravity(), "DeepSeek")
            .await
            .unwrap();

        assert_eq!(result.model_used, "LLaMA");
        assert!(result.fallback_used);
        assert_eq!(result.token_count, None);
        assert_eq!(provider.called_models(), vec![DEEPSEEK, LLAMA]);
    }

    #[tokio::test]
    async fn test_requested_model_tried_first() {
        let provider = ScriptedProvider::default()
            .fail(MINIMAX, "down")
            .fail(DEEPSEEK, "down")
            .succeed(LLAMA, "ok", Some(1));
        let catalog = ModelCatalog::builtin();

        let result = chat_with_fallback(&provider, &catalog, &gravity(), "Minimax")
            .await
            .unwrap();

        assert_eq!(provider.called_models(), vec![MINIMAX, DEEPSEEK, LLAMA]);
        assert_eq!(result.model_used, "LLaMA");
        assert!(result.fallback_used);
    }

    #[tokio::test]
    async fn test_all_candidates_fail() {
        let provider = ScriptedProvider::default()
            .fail(DEEPSEEK, "first")
            .fail(LLAMA, "second")
            .fail(MINIMAX, "third: quota exceeded");
        let catalog = ModelCatalog::builtin();

        let err = chat_with_fallback(&provider, &catalog, &gravity(), "DeepSeek")
            .await
            .unwrap_err();

        match &err {
            RelayError::ServiceExhausted {
                attempts,
                last_error,
            } => {
                assert_eq!(*attempts, 3);
                assert_eq!(last_error, "third: quota exceeded");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.to_string().contains("third: quota exceeded"));
        assert_eq!(provider.called_models().len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_model_defaults_to_first_entry() {
        let provider = ScriptedProvider::default().succeed(DEEPSEEK, "hi", None);
        let catalog = ModelCatalog::builtin();

        let result = chat_with_fallback(&provider, &catalog, &gravity(), "GPT-4")
            .await
            .unwrap();

        assert_eq!(provider.called_models(), vec![DEEPSEEK]);
        assert_eq!(result.model_used, "DeepSeek");
        assert!(!result.fallback_used);
    }

    #[tokio::test]
    async fn test_fixed_params_and_messages_forwarded() {
        let provider = ScriptedProvider::default().succeed(LLAMA, "ok", None);
        let catalog = ModelCatalog::builtin();
        let history = vec![Message::user("hi"), Message::assistant("hello")];
        let messages = assemble_messages(SYSTEM_PROMPT, &history, "Explain gravity");

        chat_with_fallback(&provider, &catalog, &messages, "LLaMA")
            .await
            .unwrap();

        let calls = provider.calls.lock().unwrap();
        let (_, sent, params) = &calls[0];
        assert_eq!(sent, &messages);
        assert_eq!(params.temperature, Some(0.7));
        assert_eq!(params.max_tokens, Some(1000));
    }

    #[tokio::test]
    async fn test_single_entry_catalog_exhausts_after_one_attempt() {
        let catalog = ModelCatalog::new(vec![ModelCatalogEntry::new(
            "Solo", "solo/model", "", "",
        )])
        .unwrap();
        let provider = ScriptedProvider::default().fail("solo/model", "boom");

        let err = chat_with_fallback(&provider, &catalog, &gravity(), "Solo")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RelayError::ServiceExhausted { attempts: 1, .. }
        ));
    }

    #[tokio::test]
    async fn test_exhausted_error_keeps_transport_cause() {
        let catalog = ModelCatalog::builtin();

        let err = chat_with_fallback(&UnreachableProvider, &catalog, &gravity(), "DeepSeek")
            .await
            .unwrap_err();

        match err {
            RelayError::ServiceExhausted { last_error, .. } => assert_eq!(
                last_error,
                "LLM request failed: tcp connect error: Connection refused"
            ),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_direct_keeps_transport_cause() {
        let err = generate_direct(&UnreachableProvider, DEEPSEEK, "hi")
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "LLM request failed: tcp connect error: Connection refused"
        );
    }

    #[tokio::test]
    async fn test_generate_direct_success() {
        let provider = ScriptedProvider::default().succeed("openai/gpt-4o", "answer", Some(9));

        let result = generate_direct(&provider, "openai/gpt-4o", "What is 2+2?")
            .await
            .unwrap();

        assert_eq!(result.model_used, "openai/gpt-4o");
        assert_eq!(result.response_text, "answer");
        assert_eq!(result.status, CompletionStatus::Success);

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (_, sent, params) = &calls[0];
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].role, Role::System);
        assert_eq!(sent[1], Message::user("What is 2+2?"));
        assert_eq!(*params, CompletionParams::default());
    }

    #[tokio::test]
    async fn test_generate_direct_has_no_fallback() {
        let provider = ScriptedProvider::default()
            .fail("DeepSeek", "invalid model id")
            .succeed(DEEPSEEK, "never reached", None);

        let err = generate_direct(&provider, "DeepSeek", "hi").await.unwrap_err();

        assert!(matches!(&err, RelayError::DirectCallFailure(m) if m == "invalid model id"));
        assert_eq!(provider.called_models(), vec!["DeepSeek"]);
    }
}
