//! MindMentor HTTP Server
//!
//! ```text
//! POST /chat      - conversation with ordered model fallback
//! POST /generate  - legacy single-model call, no fallback
//! GET  /health    - liveness
//! GET  /models    - static model catalog
//! ```
//!
//! State is built once at startup and shared read-only by every request.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::catalog::ModelCatalog;
use crate::config::ServerConfig;
use crate::dispatcher::{chat_with_fallback, generate_direct};
use crate::error::{ErrorBody, RelayError};
use crate::llm_client::{CompletionProvider, LlmClient};
use crate::prompt::{assemble_messages, SYSTEM_PROMPT};
use crate::types::{
    ChatRequest, ChatResponse, GenerateRequest, GenerateResponse, HealthResponse, ModelInfo,
    ModelsResponse,
};

pub const SERVICE_NAME: &str = "MindMentor API";

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorBody>)>;

// ============================================================================
// SERVER STATE
// ============================================================================

pub struct AppState {
    pub provider: Arc<dyn CompletionProvider>,
    pub catalog: ModelCatalog,
    pub system_prompt: String,
}

impl AppState {
    pub fn new(provider: Arc<dyn CompletionProvider>, catalog: ModelCatalog) -> Self {
        Self {
            provider,
            catalog,
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Surface extractor rejections as `{"detail": ...}` with the extractor's status.
fn rejection_to_error(rejection: JsonRejection) -> (StatusCode, Json<ErrorBody>) {
    RelayError::BadRequest {
        status: rejection.status(),
        detail: rejection.body_text(),
    }
    .into_http()
}

// ============================================================================
// /chat ENDPOINT
// ============================================================================

async fn chat_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<ChatResponse> {
    let Json(req) = payload.map_err(rejection_to_error)?;
    debug!(
        "Chat request: model={} history={}",
        req.model,
        req.history.len()
    );

    let messages = assemble_messages(&state.system_prompt, &req.history, &req.message);

    let result = chat_with_fallback(
        state.provider.as_ref(),
        &state.catalog,
        &messages,
        &req.model,
    )
    .await
    .map_err(RelayError::into_http)?;

    Ok(Json(result.into()))
}

// ============================================================================
// /generate ENDPOINT (legacy)
// ============================================================================

async fn generate_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> ApiResult<GenerateResponse> {
    let Json(req) = payload.map_err(rejection_to_error)?;
    debug!("Generate request: model={}", req.model);

    let result = generate_direct(state.provider.as_ref(), &req.model, &req.prompt)
        .await
        .map_err(RelayError::into_http)?;

    Ok(Json(result.into()))
}

// ============================================================================
// /health and /models
// ============================================================================

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
    })
}

async fn models_handler(State(state): State<Arc<AppState>>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.catalog.entries().iter().map(ModelInfo::from).collect(),
    })
}

// ============================================================================
// ROUTER
// ============================================================================

/// CORS for the web client: listed origins, credentials, any method/header.
///
/// Wildcards are not allowed together with credentials, so methods and headers
/// are mirrored, and a `*` origin entry mirrors the request origin.
pub fn cors_layer(origins: Vec<HeaderValue>) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub fn router(state: Arc<AppState>, cors: CorsLayer) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/generate", post(generate_handler))
        .route("/health", get(health_handler))
        .route("/models", get(models_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// SERVER STARTUP
// ============================================================================

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections");
}

pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let origins = config.cors_origins()?;
    let client = LlmClient::new(config.llm_config())?;
    let api_base = client.api_base().to_string();
    let state = Arc::new(AppState::new(Arc::new(client), ModelCatalog::builtin()));

    let app = router(state.clone(), cors_layer(origins.clone()));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("MindMentor API listening on {}", addr);
    info!("  Provider: {}", api_base);
    info!(
        "  Models: {}",
        state
            .catalog
            .entries()
            .iter()
            .map(|e| e.friendly_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    info!("  CORS origins: {:?}", origins);
    if config.api_key.as_deref().map_or(true, str::is_empty) {
        tracing::warn!("OPENAI_API_KEY is not set; provider calls will be rejected");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
