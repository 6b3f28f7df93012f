//! HTTP handlers for the relay API.

use super::body_sink::channel_body;
use super::error::ApiError;
use super::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chatrelay_application::{RelayInput, StopOutcome};
use chatrelay_domain::SessionId;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StopResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActiveSessionsResponse {
    pub sessions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /api/chat/{session_id}/message`
///
/// Responds as soon as the session is registered and streams the reply as
/// plain text. The generation runs on its own task: if the client hangs up,
/// it keeps going so the full reply is still persisted.
pub async fn send_message(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<MessageRequest>,
) -> Result<Response, ApiError> {
    let session_id = SessionId::parse(session_id)?;
    let generation = state
        .relay
        .start(RelayInput::new(session_id, request.content))?;

    let (sink, body) = channel_body(state.channel_capacity);
    tokio::spawn(async move {
        let outcome = generation.run(Box::new(sink)).await;
        debug!(
            session_id = %outcome.session_id,
            reason = %outcome.reason,
            client_detached = outcome.client_detached,
            "Response stream closed"
        );
    });

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response())
}

/// `POST /api/chat/{session_id}/stop`
pub async fn stop_generation(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<StopResponse>, ApiError> {
    let session_id = SessionId::parse(session_id)?;
    match state.stop.execute(&session_id) {
        StopOutcome::Stopped => Ok(Json(StopResponse { success: true })),
        StopOutcome::NotFound => Err(ApiError::not_found("No active stream found")),
    }
}

/// `GET /api/chat/active`
pub async fn active_sessions(State(state): State<AppState>) -> Json<ActiveSessionsResponse> {
    let sessions = state
        .registry()
        .active_sessions()
        .into_iter()
        .map(|id| id.as_str().to_string())
        .collect();
    Json(ActiveSessionsResponse { sessions })
}
