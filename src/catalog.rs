//! Model Catalog
//!
//! The ordered, immutable list of models the relay is allowed to call.
//! Order matters: it is the fallback order after the requested model.

use serde::Serialize;
use std::collections::HashSet;

use crate::error::RelayError;

/// One supported model and its caller-facing metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelCatalogEntry {
    /// Caller-facing label, e.g. "DeepSeek"
    pub friendly_name: String,
    /// Identifier understood by the completion provider
    pub provider_model_id: String,
    pub description: String,
    pub provider: String,
}

impl ModelCatalogEntry {
    pub fn new(
        friendly_name: impl Into<String>,
        provider_model_id: impl Into<String>,
        description: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            friendly_name: friendly_name.into(),
            provider_model_id: provider_model_id.into(),
            description: description.into(),
            provider: provider.into(),
        }
    }
}

/// Ordered model catalog, built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    entries: Vec<ModelCatalogEntry>,
}

impl ModelCatalog {
    /// Build a catalog from entries in fallback order.
    ///
    /// Rejects an empty list and duplicate friendly names or provider ids,
    /// so every candidate list built from it has one slot per entry.
    pub fn new(entries: Vec<ModelCatalogEntry>) -> Result<Self, RelayError> {
        if entries.is_empty() {
            return Err(RelayError::InvalidCatalog(
                "catalog must contain at least one model".to_string(),
            ));
        }

        let mut names = HashSet::new();
        let mut ids = HashSet::new();
        for entry in &entries {
            if !names.insert(entry.friendly_name.as_str()) {
                return Err(RelayError::InvalidCatalog(format!(
                    "duplicate model name: {}",
                    entry.friendly_name
                )));
            }
            if !ids.insert(entry.provider_model_id.as_str()) {
                return Err(RelayError::InvalidCatalog(format!(
                    "duplicate provider model id: {}",
                    entry.provider_model_id
                )));
            }
        }

        Ok(Self { entries })
    }

    /// The free-tier OpenRouter models MindMentor ships with.
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                ModelCatalogEntry::new(
                    "DeepSeek",
                    "deepseek/deepseek-r1:free",
                    "Fast and efficient responses",
                    "DeepSeek",
                ),
                ModelCatalogEntry::new(
                    "LLaMA",
                    "meta-llama/llama-3.3-70b-instruct:free",
                    "Open-source, privacy-focused",
                    "Meta",
                ),
                ModelCatalogEntry::new(
                    "Minimax",
                    "minimax/minimax-m2:free",
                    "Balanced performance and speed",
                    "Minimax",
                ),
            ],
        }
    }

    pub fn entries(&self) -> &[ModelCatalogEntry] {
        &self.entries
    }

    /// Model used when the caller asks for a name we don't know
    pub fn default_entry(&self) -> &ModelCatalogEntry {
        // Non-empty is enforced by every constructor
        &self.entries[0]
    }

    /// Resolve a friendly name to its provider model id (exact match).
    pub fn resolve(&self, friendly_name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.friendly_name == friendly_name)
            .map(|e| e.provider_model_id.as_str())
    }

    /// Reverse lookup: provider model id back to friendly name.
    pub fn friendly_name_for(&self, provider_model_id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.provider_model_id == provider_model_id)
            .map(|e| e.friendly_name.as_str())
    }

    /// Ordered provider ids to try for a request.
    ///
    /// The resolved requested model comes first (the default entry when the
    /// name is unknown), followed by every other entry in catalog order.
    pub fn candidates(&self, requested: &str) -> Vec<&str> {
        let first = self
            .resolve(requested)
            .unwrap_or(self.default_entry().provider_model_id.as_str());

        let mut candidates = Vec::with_capacity(self.entries.len());
        candidates.push(first);
        for entry in &self.entries {
            let id = entry.provider_model_id.as_str();
            if !candidates.contains(&id) {
                candidates.push(id);
            }
        }
        candidates
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
