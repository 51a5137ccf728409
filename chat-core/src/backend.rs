//! The inference seam used by the orchestrator, and its Ollama implementation.

use async_trait::async_trait;
use llm_service::ModelIdentifier;
use llm_service::services::ollama_service::{OllamaError, OllamaService};

use crate::error::InvocationError;

/// One inference call: the rendered prompt and the model to run it on.
#[derive(Debug, Clone, Copy)]
pub struct InferenceRequest<'a> {
    pub prompt: &'a str,
    pub model: &'a ModelIdentifier,
}

/// What the backend produced. `output` is `None` when the call succeeded but
/// returned nothing usable as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOutput {
    pub output: Option<String>,
}

impl RawOutput {
    pub fn text(output: impl Into<String>) -> Self {
        Self {
            output: Some(output.into()),
        }
    }

    pub fn absent() -> Self {
        Self { output: None }
    }
}

/// Anything that can turn a prompt into text for a given model.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Runs one inference call.
    ///
    /// # Errors
    /// Returns [`InvocationError`] only when the call itself failed.
    async fn invoke(&self, request: InferenceRequest<'_>) -> Result<RawOutput, InvocationError>;
}

#[async_trait]
impl InferenceBackend for OllamaService {
    async fn invoke(&self, request: InferenceRequest<'_>) -> Result<RawOutput, InvocationError> {
        match self.generate(request.model, request.prompt).await {
            Ok(output) => Ok(RawOutput { output }),
            Err(OllamaError::HttpStatus {
                status, snippet, ..
            }) => Err(InvocationError::Status {
                status: status.as_u16(),
                message: snippet,
            }),
            Err(OllamaError::Timeout { .. }) => Err(InvocationError::Timeout(self.timeout())),
            Err(err @ OllamaError::Unreachable { .. }) => {
                Err(InvocationError::Unreachable(Box::new(err)))
            }
            Err(err) => Err(InvocationError::Failed(Box::new(err))),
        }
    }
}
