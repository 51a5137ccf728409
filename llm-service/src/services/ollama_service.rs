//! Lightweight Ollama service for text generation.
//!
//! This module implements a thin client for the local Ollama API:
//! - `POST {endpoint}/api/generate`: synchronous text generation (`stream=false`)
//!
//! The model is chosen per call, so a single client serves every model the
//! directory reports. Identifiers arrive namespaced (`ollama/llama2:latest`)
//! and are sent to Ollama without the namespace.
//!
//! # Examples
//!
//! ```no_run
//! use llm_service::config::default_config::config_ollama_chat;
//! use llm_service::services::ollama_service::OllamaService;
//! use llm_service::ModelIdentifier;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let svc = OllamaService::new(config_ollama_chat()?)?;
//! let model = ModelIdentifier::new("ollama/llama2")?;
//!
//! let text = svc.generate(&model, "Write a haiku about Rust.").await?;
//! println!("Generated:\n{}", text.unwrap_or_default());
//! # Ok(()) }
//! ```

use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::{llm_model_config::LlmModelConfig, model_identifier::ModelIdentifier};
use crate::error_handler::make_snippet;

/// Errors produced by [`OllamaService`].
#[derive(Debug, Error)]
pub enum OllamaError {
    /// Invalid endpoint (empty or missing http/https).
    #[error("[LLM Service] invalid Ollama endpoint: {0}")]
    InvalidEndpoint(String),

    /// Nothing is listening at the endpoint.
    #[error("[LLM Service] Ollama is unreachable at {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client gave up waiting.
    #[error("[LLM Service] request to {url} timed out")]
    Timeout { url: String },

    /// Transport/HTTP client error.
    #[error("[LLM Service] transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-successful HTTP status from upstream.
    #[error("[LLM Service] unexpected HTTP status {status} from {url}: {snippet}")]
    HttpStatus {
        /// Numeric HTTP status code.
        status: StatusCode,
        /// Request URL.
        url: String,
        /// Backend `error` field if present, else a short body snippet.
        snippet: String,
    },
}

/// Result alias for Ollama operations.
pub type Result<T> = std::result::Result<T, OllamaError>;

/// Client timeout used when the config leaves `timeout_secs` unset.
pub const DEFAULT_GENERATE_TIMEOUT: Duration = Duration::from_secs(60);

/// Thin client for Ollama.
///
/// Initialized with a full [`LlmModelConfig`]. Reuses an HTTP client with
/// a configurable timeout.
pub struct OllamaService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    timeout: Duration,
    url_generate: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] from the given config.
    ///
    /// # Errors
    /// - [`OllamaError::InvalidEndpoint`] if `cfg.endpoint` is invalid
    /// - [`OllamaError::Transport`] if HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self> {
        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(OllamaError::InvalidEndpoint(cfg.endpoint));
        }

        let timeout = cfg
            .timeout_secs
            .map_or(DEFAULT_GENERATE_TIMEOUT, Duration::from_secs);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()?;

        let url_generate = format!("{}/api/generate", cfg.base_url());

        Ok(Self {
            client,
            cfg,
            timeout,
            url_generate,
        })
    }

    pub fn config(&self) -> &LlmModelConfig {
        &self.cfg
    }

    /// The timeout the HTTP client was built with.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Performs a **non-streaming** generation request via `/api/generate`.
    ///
    /// Returns the raw `response` text, or `None` when the backend answered
    /// successfully but without a usable string (missing field, `null`,
    /// wrong type, or a body that is not JSON). Deciding what to show in
    /// that case is up to the caller.
    ///
    /// Mapped options:
    /// - `model`        ← `model` without its provider namespace
    /// - `prompt`       ← argument
    /// - `num_predict`  ← `self.cfg.max_tokens`
    /// - `temperature`  ← `self.cfg.temperature`
    /// - `top_p`        ← `self.cfg.top_p`
    ///
    /// # Errors
    /// - [`OllamaError::Unreachable`] when the connection cannot be made
    /// - [`OllamaError::Timeout`] when the client timeout elapses
    /// - [`OllamaError::HttpStatus`] for non-2xx responses
    /// - [`OllamaError::Transport`] for other client errors
    #[instrument(skip_all, fields(model = %model))]
    pub async fn generate(&self, model: &ModelIdentifier, prompt: &str) -> Result<Option<String>> {
        let native = self.cfg.provider.native_name(model.as_str());
        let body = GenerateRequest::from_cfg(&self.cfg, native, prompt);

        debug!(prompt_chars = prompt.len(), "POST {}", self.url_generate);
        let resp = self
            .client
            .post(&self.url_generate)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            let snippet = backend_error_message(&text).unwrap_or_else(|| make_snippet(&text));
            return Err(OllamaError::HttpStatus {
                status,
                url: self.url_generate.clone(),
                snippet,
            });
        }

        match serde_json::from_str::<Value>(&text) {
            Ok(json) => {
                let out = json
                    .get("response")
                    .and_then(Value::as_str)
                    .map(str::to_owned);
                if out.is_none() {
                    warn!(body = %make_snippet(&text), "generate reply has no string `response`");
                }
                Ok(out)
            }
            Err(e) => {
                warn!(error = %e, body = %make_snippet(&text), "generate reply is not JSON");
                Ok(None)
            }
        }
    }

    fn classify(&self, err: reqwest::Error) -> OllamaError {
        if err.is_connect() {
            OllamaError::Unreachable {
                url: self.url_generate.clone(),
                source: err,
            }
        } else if err.is_timeout() {
            OllamaError::Timeout {
                url: self.url_generate.clone(),
            }
        } else {
            OllamaError::Transport(err)
        }
    }
}

/// Extracts `{"error": "..."}` from an Ollama error body, if present.
pub(crate) fn backend_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("error")?
        .as_str()
        .map(str::to_owned)
}

/* ==========================
HTTP payloads & options
========================== */

/// Request body for `/api/generate` (non-streaming).
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

impl<'a> GenerateRequest<'a> {
    /// Builds a request from config, native model name and prompt.
    fn from_cfg(cfg: &LlmModelConfig, model: &'a str, prompt: &'a str) -> Self {
        let options = GenerateOptions {
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            num_predict: cfg.max_tokens,
        };

        Self {
            model,
            prompt,
            stream: false,
            options: (!options.is_empty()).then_some(options),
        }
    }
}

/// Subset of Ollama `options`.
#[derive(Debug, Default, Serialize)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

impl GenerateOptions {
    fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.top_p.is_none() && self.num_predict.is_none()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Json, Router, http::StatusCode as AxumStatus, routing::post};
    use serde_json::json;

    use super::*;
    use crate::test_support::{config_for, spawn_fake_ollama, unused_local_url};

    fn model(id: &str) -> ModelIdentifier {
        ModelIdentifier::new(id).unwrap()
    }

    #[tokio::test]
    async fn sends_native_model_name_and_returns_response() {
        let seen = Arc::new(Mutex::new(None::<Value>));
        let seen_in_handler = seen.clone();
        let app = Router::new().route(
            "/api/generate",
            post(move |Json(body): Json<Value>| {
                let seen = seen_in_handler.clone();
                async move {
                    *seen.lock().unwrap() = Some(body);
                    Json(json!({ "model": "llama2:latest", "response": "  Hi!  ", "done": true }))
                }
            }),
        );
        let base = spawn_fake_ollama(app).await;

        let mut cfg = config_for(&base);
        cfg.max_tokens = Some(64);
        let svc = OllamaService::new(cfg).unwrap();
        let out = svc
            .generate(&model("ollama/llama2:latest"), "hello")
            .await
            .unwrap();
        assert_eq!(out.as_deref(), Some("  Hi!  "));

        let body = seen.lock().unwrap().clone().unwrap();
        assert_eq!(body["model"], "llama2:latest");
        assert_eq!(body["prompt"], "hello");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_predict"], 64);
    }

    #[tokio::test]
    async fn null_or_missing_response_is_absent_output() {
        let app = Router::new().route(
            "/api/generate",
            post(|| async { Json(json!({ "response": null })) }),
        );
        let base = spawn_fake_ollama(app).await;
        let svc = OllamaService::new(config_for(&base)).unwrap();
        assert_eq!(svc.generate(&model("ollama/x"), "p").await.unwrap(), None);

        let app = Router::new().route("/api/generate", post(|| async { "not json at all" }));
        let base = spawn_fake_ollama(app).await;
        let svc = OllamaService::new(config_for(&base)).unwrap();
        assert_eq!(svc.generate(&model("ollama/x"), "p").await.unwrap(), None);
    }

    #[tokio::test]
    async fn non_success_status_carries_backend_message() {
        let app = Router::new().route(
            "/api/generate",
            post(|| async {
                (
                    AxumStatus::NOT_FOUND,
                    Json(json!({ "error": "model 'nope' not found" })),
                )
            }),
        );
        let base = spawn_fake_ollama(app).await;
        let svc = OllamaService::new(config_for(&base)).unwrap();

        match svc.generate(&model("ollama/nope"), "p").await {
            Err(OllamaError::HttpStatus {
                status, snippet, ..
            }) => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(snippet, "model 'nope' not found");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn connection_refused_is_unreachable() {
        let base = unused_local_url().await;
        let svc = OllamaService::new(config_for(&base)).unwrap();
        let err = svc.generate(&model("ollama/x"), "p").await.unwrap_err();
        assert!(matches!(err, OllamaError::Unreachable { .. }), "{err:?}");
    }

    #[test]
    fn client_timeout_follows_config() {
        let base = "http://127.0.0.1:11434";
        let svc = OllamaService::new(config_for(base)).unwrap();
        assert_eq!(svc.timeout(), Duration::from_secs(5));

        let mut cfg = config_for(base);
        cfg.timeout_secs = None;
        let svc = OllamaService::new(cfg).unwrap();
        assert_eq!(svc.timeout(), DEFAULT_GENERATE_TIMEOUT);
    }

    #[tokio::test]
    async fn slow_backend_is_a_timeout() {
        let app = Router::new().route(
            "/api/generate",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"response": "late"}))
            }),
        );
        let base = spawn_fake_ollama(app).await;
        let mut cfg = config_for(&base);
        cfg.timeout_secs = Some(1);
        let svc = OllamaService::new(cfg).unwrap();

        let err = svc.generate(&model("ollama/x"), "p").await.unwrap_err();
        assert!(matches!(err, OllamaError::Timeout { .. }), "{err:?}");
        assert_eq!(svc.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn rejects_endpoint_without_scheme() {
        let cfg = config_for("localhost:11434");
        assert!(matches!(
            OllamaService::new(cfg),
            Err(OllamaError::InvalidEndpoint(_))
        ));
    }
}
