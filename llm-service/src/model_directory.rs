//! Model directory backed by Ollama's `GET {endpoint}/api/tags`.
//!
//! [`ModelDirectory::list_models`] is strict and classifies failures into
//! [`DirectoryError`]. [`ModelDirectory::list_models_or_default`] is resilient:
//! it never fails and substitutes [`default_models`] plus a warning, which is
//! what a UI wants for populating its model picker.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{
    llm_model_config::LlmModelConfig, llm_provider::LlmProvider,
    model_identifier::ModelIdentifier,
};
use crate::error_handler::{DirectoryError, LlmError, make_snippet};
use crate::services::ollama_service::backend_error_message;

const GENERIC_LISTING_ERROR: &str = "Failed to fetch models from Ollama server.";
const EMPTY_LISTING_WARNING: &str = "No models returned from Ollama. Using defaults.";

/// A selectable model: opaque identifier plus display label.
///
/// Serialized as `{ "value": "...", "label": "..." }` to match what select
/// widgets expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    #[serde(rename = "value")]
    pub identifier: ModelIdentifier,
    pub label: String,
}

impl ModelDescriptor {
    fn fallback(identifier: &str, label: &str) -> Self {
        Self {
            identifier: ModelIdentifier(identifier.to_string()),
            label: label.to_string(),
        }
    }
}

/// Built-in list used whenever the backend cannot provide one.
pub fn default_models() -> Vec<ModelDescriptor> {
    vec![
        ModelDescriptor::fallback("ollama/llama2", "Llama 2 (Default Fallback)"),
        ModelDescriptor::fallback("ollama/mistral", "Mistral (Default Fallback)"),
    ]
}

/// Non-fatal problem encountered while listing models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingWarning {
    /// `unreachable`, `backend_error`, `malformed_response` or `empty`.
    pub kind: &'static str,
    pub message: String,
}

impl From<&DirectoryError> for ListingWarning {
    fn from(err: &DirectoryError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Outcome of the resilient listing: always a usable, non-empty list.
#[derive(Debug, Clone, Serialize)]
pub struct ModelListing {
    pub models: Vec<ModelDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<ListingWarning>,
}

/// Read-only client for the backend's model list.
pub struct ModelDirectory {
    client: reqwest::Client,
    provider: LlmProvider,
    url_tags: String,
}

impl ModelDirectory {
    /// Creates a directory for the backend named in `cfg`.
    ///
    /// `timeout_secs` bounds each listing request (default 10s); listing
    /// should stay snappy even when generation is configured to be patient.
    ///
    /// # Errors
    /// Returns [`LlmError::HttpTransport`] if the HTTP client cannot be built.
    pub fn new(cfg: &LlmModelConfig, timeout_secs: Option<u64>) -> Result<Self, LlmError> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(10));
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let url_tags = format!("{}/api/tags", cfg.base_url());

        info!(
            url = %url_tags,
            timeout_secs = timeout.as_secs(),
            "ModelDirectory initialized"
        );

        Ok(Self {
            client,
            provider: cfg.provider,
            url_tags,
        })
    }

    /// Lists the models currently loaded in the backend.
    ///
    /// Each `{ "name": n }` entry becomes `identifier = "ollama/" + n`,
    /// `label = n`. Entries without a usable name are skipped.
    ///
    /// # Errors
    /// - [`DirectoryError::Unreachable`] when the request cannot be sent
    /// - [`DirectoryError::BackendError`] for non-2xx statuses
    /// - [`DirectoryError::MalformedResponse`] when `models` is missing or not an array
    #[instrument(skip_all, fields(url = %self.url_tags))]
    pub async fn list_models(&self) -> Result<Vec<ModelDescriptor>, DirectoryError> {
        let start = Instant::now();
        debug!("GET {}", self.url_tags);

        let resp = self
            .client
            .get(&self.url_tags)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CACHE_CONTROL, "no-cache, no-store")
            .header(header::PRAGMA, "no-cache")
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| self.unreachable(e))?;
        let latency_ms = start.elapsed().as_millis();

        if !status.is_success() {
            let message =
                backend_error_message(&text).unwrap_or_else(|| GENERIC_LISTING_ERROR.to_string());
            error!(
                %status,
                snippet = %make_snippet(&text),
                latency_ms,
                "GET /api/tags returned non-success status"
            );
            return Err(DirectoryError::BackendError {
                status: status.as_u16(),
                message,
            });
        }

        let json: Value = serde_json::from_str(&text).map_err(|e| {
            DirectoryError::MalformedResponse(format!("body is not JSON: {e}"))
        })?;
        let entries = json
            .get("models")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                DirectoryError::MalformedResponse(format!(
                    "expected `models` array, got: {}",
                    make_snippet(&text)
                ))
            })?;

        let models: Vec<ModelDescriptor> = entries
            .iter()
            .filter_map(|entry| {
                let name = entry.get("name").and_then(Value::as_str)?.trim();
                if name.is_empty() {
                    return None;
                }
                Some(ModelDescriptor {
                    identifier: ModelIdentifier(self.provider.qualify(name)),
                    label: name.to_string(),
                })
            })
            .collect();

        if models.len() != entries.len() {
            warn!(
                skipped = entries.len() - models.len(),
                "some /api/tags entries had no usable `name`"
            );
        }
        info!(count = models.len(), latency_ms, "listed Ollama models");
        Ok(models)
    }

    /// Lists models, degrading to [`default_models`] on any failure.
    ///
    /// This method is **resilient**: it never returns an error. An empty
    /// backend list is also replaced by the defaults.
    pub async fn list_models_or_default(&self) -> ModelListing {
        match self.list_models().await {
            Ok(models) if !models.is_empty() => ModelListing {
                models,
                warning: None,
            },
            Ok(_) => {
                warn!("Ollama reported no models; using fallback list");
                ModelListing {
                    models: default_models(),
                    warning: Some(ListingWarning {
                        kind: "empty",
                        message: EMPTY_LISTING_WARNING.to_string(),
                    }),
                }
            }
            Err(err) => {
                warn!(kind = err.kind(), error = %err, "model listing failed; using fallback list");
                ModelListing {
                    models: default_models(),
                    warning: Some(ListingWarning::from(&err)),
                }
            }
        }
    }

    fn unreachable(&self, err: reqwest::Error) -> DirectoryError {
        DirectoryError::Unreachable {
            url: self.url_tags.clone(),
            reason: err.to_string(),
        }
    }
}

/// Picks the model a session should use from what is available.
///
/// Keeps `stored` when it is still offered, otherwise falls back to the first
/// available model. Returns `None` only for an empty list.
pub fn select_model(
    available: &[ModelDescriptor],
    stored: Option<&ModelIdentifier>,
) -> Option<ModelIdentifier> {
    stored
        .filter(|s| available.iter().any(|m| &m.identifier == *s))
        .cloned()
        .or_else(|| available.first().map(|m| m.identifier.clone()))
}

#[cfg(test)]
mod tests {
    use axum::{Json, Router, http::StatusCode, routing::get};
    use serde_json::json;

    use super::*;
    use crate::test_support::{config_for, spawn_fake_ollama, unused_local_url};

    async fn directory_for(app: Router) -> ModelDirectory {
        let base = spawn_fake_ollama(app).await;
        ModelDirectory::new(&config_for(&base), Some(5)).unwrap()
    }

    #[tokio::test]
    async fn maps_tags_to_descriptors() {
        let app = Router::new().route(
            "/api/tags",
            get(|| async {
                Json(json!({
                    "models": [
                        { "name": "llama2:latest", "modified_at": "2024-05-01T10:00:00Z", "size": 123 }
                    ]
                }))
            }),
        );
        let dir = directory_for(app).await;

        let models = dir.list_models().await.unwrap();
        assert_eq!(
            models,
            vec![ModelDescriptor {
                identifier: ModelIdentifier::new("ollama/llama2:latest").unwrap(),
                label: "llama2:latest".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn sends_no_cache_headers() {
        let app = Router::new().route(
            "/api/tags",
            get(|headers: axum::http::HeaderMap| async move {
                let cc = headers
                    .get("cache-control")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({ "models": [ { "name": cc } ] }))
            }),
        );
        let dir = directory_for(app).await;
        let models = dir.list_models().await.unwrap();
        assert_eq!(models[0].label, "no-cache, no-store");
    }

    #[tokio::test]
    async fn non_success_status_is_backend_error_with_message() {
        let app = Router::new().route(
            "/api/tags",
            get(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "disk on fire" })),
                )
            }),
        );
        let dir = directory_for(app).await;

        match dir.list_models().await {
            Err(DirectoryError::BackendError { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "disk on fire");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_error_body_uses_generic_message() {
        let app = Router::new().route(
            "/api/tags",
            get(|| async { (StatusCode::BAD_GATEWAY, "upstream hiccup") }),
        );
        let dir = directory_for(app).await;

        match dir.list_models().await {
            Err(DirectoryError::BackendError { status, message }) => {
                assert_eq!(status, 502);
                assert_eq!(message, GENERIC_LISTING_ERROR);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_or_non_array_models_is_malformed() {
        let app = Router::new().route("/api/tags", get(|| async { Json(json!({ "tags": [] })) }));
        let dir = directory_for(app).await;
        assert!(matches!(
            dir.list_models().await,
            Err(DirectoryError::MalformedResponse(_))
        ));

        let app = Router::new().route(
            "/api/tags",
            get(|| async { Json(json!({ "models": "llama2" })) }),
        );
        let dir = directory_for(app).await;
        assert!(matches!(
            dir.list_models().await,
            Err(DirectoryError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_backend_falls_back_with_warning() {
        let base = unused_local_url().await;
        let dir = ModelDirectory::new(&config_for(&base), Some(2)).unwrap();

        assert!(matches!(
            dir.list_models().await,
            Err(DirectoryError::Unreachable { .. })
        ));

        let listing = dir.list_models_or_default().await;
        assert_eq!(listing.models, default_models());
        assert_eq!(listing.warning.map(|w| w.kind), Some("unreachable"));
    }

    #[tokio::test]
    async fn empty_list_falls_back_with_empty_warning() {
        let app = Router::new().route("/api/tags", get(|| async { Json(json!({ "models": [] })) }));
        let dir = directory_for(app).await;

        let listing = dir.list_models_or_default().await;
        assert_eq!(listing.models, default_models());
        assert_eq!(listing.warning.map(|w| w.kind), Some("empty"));
    }

    #[test]
    fn select_model_prefers_stored_when_available() {
        let available = default_models();
        let mistral = ModelIdentifier::new("ollama/mistral").unwrap();
        let gone = ModelIdentifier::new("ollama/phi3").unwrap();

        assert_eq!(select_model(&available, Some(&mistral)), Some(mistral));
        assert_eq!(
            select_model(&available, Some(&gone)),
            Some(available[0].identifier.clone())
        );
        assert_eq!(
            select_model(&available, None),
            Some(available[0].identifier.clone())
        );
        assert_eq!(select_model(&[], None), None);
    }
}
