use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chat_core::SessionId;

use crate::{
    core::app_state::AppState, error_handler::AppResult,
    routes::sessions::session_request::HistoryResponse,
};

/// Handler: GET /sessions/{id}/history
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<HistoryResponse>> {
    let session = SessionId::new(id)?;
    let history = state.sessions.history(&session).await?;
    Ok(Json(HistoryResponse { history }))
}

/// Handler: DELETE /sessions/{id}/history
pub async fn clear_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let session = SessionId::new(id)?;
    state.sessions.clear(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}
