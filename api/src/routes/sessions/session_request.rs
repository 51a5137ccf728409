use chat_core::{SessionWarning, Turn};
use llm_service::ModelIdentifier;
use serde::{Deserialize, Serialize};

/// Request payload for POST /sessions/{id}/messages.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
    /// Overrides the stored selection for this and later exchanges.
    #[serde(default)]
    pub model: Option<String>,
}

/// Response payload for POST /sessions/{id}/messages.
#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub response: String,
    pub history: Vec<Turn>,
    pub model: ModelIdentifier,
    pub warnings: Vec<SessionWarning>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<Turn>,
}

#[derive(Debug, Serialize)]
pub struct SelectedModelResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelIdentifier>,
}

/// Request payload for PUT /sessions/{id}/model.
#[derive(Debug, Deserialize)]
pub struct SelectModelRequest {
    pub model: String,
}
