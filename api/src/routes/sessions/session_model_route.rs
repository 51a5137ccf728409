use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use chat_core::SessionId;
use llm_service::ModelIdentifier;

use crate::{
    core::app_state::AppState,
    error_handler::AppResult,
    routes::sessions::session_request::{SelectModelRequest, SelectedModelResponse},
};

/// Handler: GET /sessions/{id}/model
pub async fn get_model(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<SelectedModelResponse>> {
    let session = SessionId::new(id)?;
    let model = state.sessions.selected_model(&session).await?;
    Ok(Json(SelectedModelResponse { model }))
}

/// Handler: PUT /sessions/{id}/model
pub async fn put_model(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<SelectModelRequest>, JsonRejection>,
) -> AppResult<StatusCode> {
    let Json(body) = body?;
    let session = SessionId::new(id)?;
    let model = ModelIdentifier::new(&body.model)?;
    state.sessions.select_model(&session, &model).await?;
    Ok(StatusCode::NO_CONTENT)
}
