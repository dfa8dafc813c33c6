//! Relay error taxonomy and its HTTP status mapping.

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    /// One candidate model failed. Absorbed by the fallback loop.
    #[error("model {model} failed: {message}")]
    CandidateFailure { model: String, message: String },

    /// Every candidate failed; carries the last candidate's error text.
    #[error("All AI models are currently unavailable. Last error: {last_error}")]
    ServiceExhausted { attempts: usize, last_error: String },

    /// The no-fallback path failed. The provider message is passed through raw.
    #[error("{0}")]
    DirectCallFailure(String),

    /// Request body rejected before reaching the relay
    #[error("{detail}")]
    BadRequest { status: StatusCode, detail: String },

    #[error("Invalid model catalog: {0}")]
    InvalidCatalog(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// FastAPI-style error body: `{"detail": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ServiceExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::BadRequest { status, .. } => *status,
            Self::CandidateFailure { .. }
            | Self::DirectCallFailure(_)
            | Self::InvalidCatalog(_)
            | Self::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert into the `(status, body)` pair handlers return.
    pub fn into_http(self) -> (StatusCode, Json<ErrorBody>) {
        let status = self.status_code();
        (
            status,
            Json(ErrorBody {
                detail: self.to_string(),
            }),
        )
    }
}
