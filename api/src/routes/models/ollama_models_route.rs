//! GET /ollama-models: strict model listing, errors passed through.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use llm_service::DirectoryError;
use tracing::{debug, error};

use crate::{
    core::app_state::AppState,
    routes::models::models_response::{OllamaModelsError, OllamaModelsResponse},
};

const UNREACHABLE_MESSAGE: &str =
    "Ollama server is not running or is not accessible at the configured address.";
const MALFORMED_MESSAGE: &str = "Unexpected response format from Ollama server.";

/// Handler: GET /ollama-models
///
/// # Example
/// ```bash
/// curl http://127.0.0.1:9002/ollama-models
/// # {"models":[{"value":"ollama/llama2:latest","label":"llama2:latest"}]}
/// ```
pub async fn ollama_models(State(state): State<Arc<AppState>>) -> Response {
    match state.directory.list_models().await {
        Ok(models) => {
            debug!(count = models.len(), "ollama_models: ok");
            Json(OllamaModelsResponse { models }).into_response()
        }
        Err(err) => {
            error!(kind = err.kind(), error = %err, "ollama_models: listing failed");
            let (status, body) = error_body(err);
            (status, Json(body)).into_response()
        }
    }
}

fn error_body(err: DirectoryError) -> (StatusCode, OllamaModelsError) {
    match err {
        DirectoryError::Unreachable { reason, .. } => (
            StatusCode::SERVICE_UNAVAILABLE,
            OllamaModelsError {
                error: UNREACHABLE_MESSAGE.to_string(),
                details: Some(reason),
            },
        ),
        DirectoryError::BackendError { status, message } => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
            OllamaModelsError {
                error: message,
                details: Some(format!("Status: {status}")),
            },
        ),
        DirectoryError::MalformedResponse(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            OllamaModelsError {
                error: MALFORMED_MESSAGE.to_string(),
                details: None,
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_status_is_passed_through() {
        let (status, body) = error_body(DirectoryError::BackendError {
            status: 404,
            message: "not here".into(),
        });
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "not here");
        assert_eq!(body.details.as_deref(), Some("Status: 404"));
    }

    #[test]
    fn unreachable_and_malformed() {
        let (status, body) = error_body(DirectoryError::Unreachable {
            url: "http://127.0.0.1:1/api/tags".into(),
            reason: "connection refused".into(),
        });
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.error, UNREACHABLE_MESSAGE);

        let (status, body) = error_body(DirectoryError::MalformedResponse("x".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.details.is_none());
    }
}
