//! Server Configuration
//!
//! Command-line flags with environment fallbacks. Parsed once at startup;
//! nothing here is mutated afterwards.

use axum::http::HeaderValue;
use clap::Parser;

use crate::error::RelayError;
use crate::llm_client::{LlmConfig, DEFAULT_API_BASE};

pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:3001";

#[derive(Parser, Debug, Clone)]
#[command(name = "mindmentor-server")]
#[command(about = "MindMentor API - tutoring chat relay with model fallback")]
pub struct ServerConfig {
    /// Server host
    #[arg(long, default_value = "0.0.0.0", env = "MINDMENTOR_HOST")]
    pub host: String,

    /// Server port
    #[arg(short, long, default_value_t = 8000, env = "MINDMENTOR_PORT")]
    pub port: u16,

    /// Provider API key (not validated here; the provider rejects bad keys)
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// OpenAI-compatible API base URL
    #[arg(long, default_value = DEFAULT_API_BASE, env = "LLM_API_BASE")]
    pub api_base: String,

    /// Provider request timeout in seconds
    #[arg(long, default_value_t = 120, env = "LLM_TIMEOUT_SECS")]
    pub timeout_secs: u64,

    /// Comma-separated list of browser origins allowed by CORS
    #[arg(long, default_value = DEFAULT_ALLOWED_ORIGINS, env = "MINDMENTOR_ALLOWED_ORIGINS")]
    pub allowed_origins: String,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            api_base: self.api_base.clone(),
            api_key: self.api_key.clone().unwrap_or_default(),
            timeout_secs: self.timeout_secs,
            ..Default::default()
        }
    }

    pub fn cors_origins(&self) -> Result<Vec<HeaderValue>, RelayError> {
        parse_origins(&self.allowed_origins)
    }
}

/// Split a comma-separated origin list, skipping blanks.
pub fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>, RelayError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|e| {
                RelayError::InvalidConfig(format!("CORS origin '{}': {}", origin, e))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::try_parse_from(["mindmentor-server"]).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.bind_addr(), "0.0.0.0:8000");
        assert_eq!(config.timeout_secs, 120);
    }

    #[test]
    fn test_llm_config_from_flags() {
        let config = ServerConfig::try_parse_from([
            "mindmentor-server",
            "--api-key",
            "sk-or-test",
            "--api-base",
            "http://127.0.0.1:9999/v1",
            "--timeout-secs",
            "5",
        ])
        .unwrap();

        let llm = config.llm_config();
        assert_eq!(llm.api_key, "sk-or-test");
        assert_eq!(llm.api_base, "http://127.0.0.1:9999/v1");
        assert_eq!(llm.timeout_secs, 5);
        assert_eq!(llm.title, "MindMentor");
    }

    #[test]
    fn test_parse_origins() {
        let origins = parse_origins(" http://localhost:3000, ,http://localhost:3001").unwrap();
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[0], "http://localhost:3000");

        assert!(parse_origins("").unwrap().is_empty());
        assert!(parse_origins("http://bad\norigin").is_err());
    }
}
