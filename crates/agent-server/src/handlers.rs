//! HTTP Handlers

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use agent_core::Message;
use crypto_agent::PriceSample;

use crate::session::SessionId;
use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider: String,
    pub provider_connected: bool,
    pub sessions: usize,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
    pub session_id: String,
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct PriceHistoryResponse {
    pub session_id: String,
    pub samples: Vec<PriceSample>,
    pub latest: Option<PriceSample>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>, code: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

fn session_not_found(id: &SessionId) -> ApiError {
    api_error(
        StatusCode::NOT_FOUND,
        format!("Session {id} not found"),
        "SESSION_NOT_FOUND",
    )
}

// ============================================================================
// Router
// ============================================================================

/// API routes; static assets and layers are added by `main`
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/chat", post(chat_handler))
        .route("/api/sessions/{id}/messages", get(session_messages))
        .route("/api/sessions/{id}/prices", get(session_prices))
        .route("/api/sessions/{id}/reset", post(reset_session))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider_connected = state.provider.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.provider.name().to_string(),
        provider_connected,
        sessions: state.sessions.len(),
    })
}

/// Main chat endpoint
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let text = payload.message.trim();
    if text.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Message must not be empty",
            "EMPTY_MESSAGE",
        ));
    }

    let requested = payload.session_id.map(SessionId::from_string);
    let (session_id, session) = state.sessions.get_or_create(requested, || state.new_agent());

    let reply = session.lock().await.chat(text).await;
    tracing::info!(
        session = %session_id,
        language = reply.language.as_deref().unwrap_or("-"),
        quoted_price = reply.quoted_price.is_some(),
        "Chat turn complete"
    );

    Ok(Json(ChatResponse {
        message: reply.text,
        session_id: session_id.to_string(),
        language: reply.language,
        price: reply.quoted_price,
    }))
}

/// Transcript of a session
pub async fn session_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let id = SessionId::from_string(id);
    let session = state.sessions.get(&id).ok_or_else(|| session_not_found(&id))?;
    let transcript = session.lock().await.transcript().to_vec();
    Ok(Json(transcript))
}

/// Prices quoted in a session over the last day
pub async fn session_prices(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PriceHistoryResponse>, ApiError> {
    let id = SessionId::from_string(id);
    let session = state.sessions.get(&id).ok_or_else(|| session_not_found(&id))?;
    let mut session = session.lock().await;
    let history = session.price_history();

    Ok(Json(PriceHistoryResponse {
        session_id: id.to_string(),
        samples: history.samples().cloned().collect(),
        latest: history.latest().cloned(),
    }))
}

/// Clear a session's conversation and chart
pub async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = SessionId::from_string(id);
    let session = state.sessions.get(&id).ok_or_else(|| session_not_found(&id))?;
    session.lock().await.reset();
    tracing::info!(session = %id, "Session reset");
    Ok(StatusCode::NO_CONTENT)
}
