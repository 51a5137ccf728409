//! POST /converse: stateless exchange, the caller owns the history.

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use llm_service::ModelIdentifier;
use tracing::debug;

use crate::{
    core::app_state::AppState,
    error_handler::AppResult,
    routes::converse::converse_request::{ConverseRequest, ConverseResponse},
};

/// Handler: POST /converse
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:9002/converse \
///   -H 'content-type: application/json' \
///   -d '{"message":"Hi","chatHistory":[],"modelName":"ollama/llama2:latest"}'
/// ```
pub async fn converse(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ConverseRequest>, JsonRejection>,
) -> AppResult<Json<ConverseResponse>> {
    let Json(body) = body?;

    let history = body.chat_history.unwrap_or_default();
    let model = parse_model(body.model_name.as_deref())?;
    debug!(history_len = history.len(), model = ?model, "converse: start");

    let result = state
        .sessions
        .orchestrator()
        .converse(&body.message, &history, model.as_ref())
        .await?;

    Ok(Json(ConverseResponse {
        response: result.response_text,
        updated_chat_history: result.updated_history,
    }))
}

/// Blank or missing model names select the default.
pub(crate) fn parse_model(raw: Option<&str>) -> AppResult<Option<ModelIdentifier>> {
    match raw.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(Some(ModelIdentifier::new(name)?)),
        _ => Ok(None),
    }
}
