//! One exchange: message + history + model in, reply + extended history out.

use std::sync::Arc;
use std::time::Duration;

use llm_service::ModelIdentifier;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::backend::{InferenceBackend, InferenceRequest};
use crate::error::{ChatError, InvocationError};
use crate::prompt::render_prompt;
use crate::turn::Turn;

/// Reply used when the backend succeeds without producing usable text.
pub const FALLBACK_RESPONSE: &str =
    "I'm sorry, I was unable to generate a response at this moment.";

/// Result of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExchangeResult {
    /// Assistant reply; never empty.
    pub response_text: String,
    /// Prior history followed by the user turn and the model turn.
    pub updated_history: Vec<Turn>,
}

/// Stateless exchange driver.
///
/// Holds only read-only configuration: the backend handle, the default model
/// and an optional deadline. Every call is independent of the previous ones.
#[derive(Clone)]
pub struct Orchestrator {
    backend: Arc<dyn InferenceBackend>,
    default_model: ModelIdentifier,
    timeout: Option<Duration>,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn InferenceBackend>, default_model: ModelIdentifier) -> Self {
        Self {
            backend,
            default_model,
            timeout: None,
        }
    }

    /// Sets a caller-side deadline for the backend call.
    ///
    /// When it elapses the exchange fails with [`InvocationError::Timeout`]
    /// and the pending call is dropped, so a late reply is never applied.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn default_model(&self) -> &ModelIdentifier {
        &self.default_model
    }

    /// Runs one exchange.
    ///
    /// `history` is read, never modified; the returned history is a new vector.
    ///
    /// # Errors
    /// - [`ChatError::EmptyMessage`] if `message` is blank
    /// - [`ChatError::BackendInvocation`] if the backend call fails or times out
    #[instrument(skip_all, fields(history_len = history.len()))]
    pub async fn converse(
        &self,
        message: &str,
        history: &[Turn],
        model: Option<&ModelIdentifier>,
    ) -> Result<ExchangeResult, ChatError> {
        if message.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let model = model.unwrap_or(&self.default_model);
        let prompt = render_prompt(history, message);
        debug!(%model, prompt_chars = prompt.len(), "invoking inference backend");

        let request = InferenceRequest {
            prompt: &prompt,
            model,
        };
        let raw = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.backend.invoke(request))
                .await
                .map_err(|_| InvocationError::Timeout(limit))?,
            None => self.backend.invoke(request).await,
        }
        .map_err(|e| {
            warn!(%model, error = %e, "inference backend call failed");
            e
        })?;

        let response_text = normalize_output(raw.output.as_deref());

        let mut updated_history = Vec::with_capacity(history.len() + 2);
        updated_history.extend_from_slice(history);
        updated_history.push(Turn::user(message));
        updated_history.push(Turn::model(response_text.clone()));

        info!(%model, reply_chars = response_text.len(), "exchange completed");
        Ok(ExchangeResult {
            response_text,
            updated_history,
        })
    }
}

/// Trims backend output, substituting [`FALLBACK_RESPONSE`] when nothing is left.
pub fn normalize_output(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        Some(_) => {
            warn!("model output was an empty string");
            FALLBACK_RESPONSE.to_string()
        }
        None => {
            warn!("model output was null or invalid");
            FALLBACK_RESPONSE.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::backend::RawOutput;

    /// Returns a canned reply and remembers what it was asked.
    struct ScriptedBackend {
        reply: Mutex<Option<Result<RawOutput, InvocationError>>>,
        seen: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedBackend {
        fn replying(reply: Result<RawOutput, InvocationError>) -> Arc<Self> {
            Arc::new(Self {
                reply: Mutex::new(Some(reply)),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl InferenceBackend for ScriptedBackend {
        async fn invoke(
            &self,
            request: InferenceRequest<'_>,
        ) -> Result<RawOutput, InvocationError> {
            self.seen
                .lock()
                .unwrap()
                .push((request.model.to_string(), request.prompt.to_string()));
            self.reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(RawOutput::text("again")))
        }
    }

    struct NeverAnswers;

    #[async_trait]
    impl InferenceBackend for NeverAnswers {
        async fn invoke(&self, _: InferenceRequest<'_>) -> Result<RawOutput, InvocationError> {
            std::future::pending().await
        }
    }

    fn id(s: &str) -> ModelIdentifier {
        ModelIdentifier::new(s).unwrap()
    }

    fn orchestrator(backend: Arc<dyn InferenceBackend>) -> Orchestrator {
        Orchestrator::new(backend, id("ollama/gemma3:1b"))
    }

    #[tokio::test]
    async fn appends_user_then_model_turn() {
        let backend = ScriptedBackend::replying(Ok(RawOutput::text("  Hello there.  ")));
        let history = vec![Turn::user("hi"), Turn::model("hey")];

        let out = orchestrator(backend.clone())
            .converse("how are you?", &history, None)
            .await
            .unwrap();

        assert_eq!(out.response_text, "Hello there.");
        assert_eq!(out.updated_history.len(), history.len() + 2);
        assert_eq!(out.updated_history[..2], history[..]);
        assert_eq!(out.updated_history[2], Turn::user("how are you?"));
        assert_eq!(out.updated_history[3], Turn::model("Hello there."));
    }

    #[tokio::test]
    async fn caller_history_is_not_mutated() {
        let backend = ScriptedBackend::replying(Ok(RawOutput::text("one")));
        let orch = orchestrator(backend);
        let history = vec![Turn::user("seed"), Turn::model("ok")];
        let snapshot = history.clone();

        let a = orch.converse("first", &history, None).await.unwrap();
        let b = orch.converse("second", &history, None).await.unwrap();

        assert_eq!(history, snapshot);
        assert_eq!(a.updated_history[2], Turn::user("first"));
        assert_eq!(b.updated_history[2], Turn::user("second"));
        assert_eq!(b.updated_history.len(), 4);
    }

    #[tokio::test]
    async fn empty_null_and_invalid_output_use_fallback() {
        for raw in [RawOutput::text(""), RawOutput::text(" \n\t "), RawOutput::absent()] {
            let backend = ScriptedBackend::replying(Ok(raw));
            let out = orchestrator(backend).converse("q", &[], None).await.unwrap();
            assert_eq!(out.response_text, FALLBACK_RESPONSE);
            assert_eq!(out.updated_history[1], Turn::model(FALLBACK_RESPONSE));
        }
    }

    #[tokio::test]
    async fn uses_explicit_model_else_default() {
        let backend = ScriptedBackend::replying(Ok(RawOutput::text("x")));
        let orch = orchestrator(backend.clone());

        orch.converse("a", &[], Some(&id("ollama/mistral")))
            .await
            .unwrap();
        orch.converse("b", &[], None).await.unwrap();

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen[0].0, "ollama/mistral");
        assert_eq!(seen[1].0, "ollama/gemma3:1b");
        assert!(seen[0].1.contains("User Message: a"));
    }

    #[tokio::test]
    async fn blank_message_is_rejected_before_backend() {
        let backend = ScriptedBackend::replying(Ok(RawOutput::text("x")));
        let err = orchestrator(backend.clone())
            .converse("   ", &[], None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::EmptyMessage));
        assert!(backend.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn invocation_failure_is_surfaced_not_recovered() {
        let backend = ScriptedBackend::replying(Err(InvocationError::Status {
            status: 404,
            message: "model not found".into(),
        }));
        let err = orchestrator(backend)
            .converse("q", &[], None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ChatError::BackendInvocation(InvocationError::Status { status: 404, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_turns_into_timeout_error() {
        let orch = orchestrator(Arc::new(NeverAnswers)).with_timeout(Some(Duration::from_secs(5)));
        let err = orch.converse("q", &[], None).await.unwrap_err();
        assert!(matches!(
            err,
            ChatError::BackendInvocation(InvocationError::Timeout(d)) if d == Duration::from_secs(5)
        ));
    }

    #[test]
    fn normalize_output_trims() {
        assert_eq!(normalize_output(Some("  Hello there.  ")), "Hello there.");
        assert_eq!(normalize_output(Some("")), FALLBACK_RESPONSE);
        assert_eq!(normalize_output(None), FALLBACK_RESPONSE);
    }
}
