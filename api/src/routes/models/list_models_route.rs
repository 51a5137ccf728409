//! GET /models: resilient listing with default fallback and stored selection.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use chat_core::SessionId;
use llm_service::model_directory::select_model;
use tracing::warn;

use crate::{
    core::app_state::AppState,
    error_handler::AppResult,
    routes::models::models_response::{ModelsQuery, ModelsResponse},
};

/// Handler: GET /models?session=<id>
///
/// Never fails because of the backend: on any listing problem the built-in
/// defaults are returned together with a `warning`.
pub async fn list_models(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ModelsQuery>, QueryRejection>,
) -> AppResult<Json<ModelsResponse>> {
    let Query(query) = query?;
    let session = query.session.map(SessionId::new).transpose()?;

    let listing = state.directory.list_models_or_default().await;

    let stored = match &session {
        Some(id) => state.sessions.selected_model(id).await.unwrap_or_else(|e| {
            warn!(session = %id, error = %e, "could not read stored model selection");
            None
        }),
        None => None,
    };
    let selected = select_model(&listing.models, stored.as_ref());

    Ok(Json(ModelsResponse {
        models: listing.models,
        selected,
        warning: listing.warning,
    }))
}
