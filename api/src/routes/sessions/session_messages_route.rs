use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use chat_core::SessionId;

use crate::{
    core::app_state::AppState,
    error_handler::AppResult,
    routes::{
        converse::converse_route::parse_model,
        sessions::session_request::{SendMessageRequest, SendMessageResponse},
    },
};

/// Handler: POST /sessions/{id}/messages
///
/// Answers 409 while another exchange for the same session is pending.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<SendMessageRequest>, JsonRejection>,
) -> AppResult<Json<SendMessageResponse>> {
    let Json(body) = body?;
    let session = SessionId::new(id)?;
    let model = parse_model(body.model.as_deref())?;

    let outcome = state
        .sessions
        .send(&session, &body.message, model.as_ref())
        .await?;

    Ok(Json(SendMessageResponse {
        response: outcome.result.response_text,
        history: outcome.result.updated_history,
        model: outcome.model,
        warnings: outcome.warnings,
    }))
}
