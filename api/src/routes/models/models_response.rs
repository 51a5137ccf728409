use llm_service::{ModelDescriptor, ModelIdentifier, model_directory::ListingWarning};
use serde::{Deserialize, Serialize};

/// Response payload for GET /ollama-models.
#[derive(Debug, Serialize)]
pub struct OllamaModelsResponse {
    pub models: Vec<ModelDescriptor>,
}

/// Failure payload for GET /ollama-models.
#[derive(Debug, Serialize)]
pub struct OllamaModelsError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Query for GET /models.
#[derive(Debug, Default, Deserialize)]
pub struct ModelsQuery {
    /// Session whose stored selection should be applied.
    #[serde(default)]
    pub session: Option<String>,
}

/// Response payload for GET /models. The list is never empty.
#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<ModelIdentifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<ListingWarning>,
}
