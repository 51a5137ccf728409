use chat_core::Turn;
use serde::{Deserialize, Serialize};

/// Request payload for POST /converse.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverseRequest {
    /// The new user message.
    pub message: String,
    /// Prior turns as `[{role, content}, ...]`, used exactly as sent. An entry
    /// with an unknown role or no content rejects the request; extra fields
    /// such as a UI-side `id` are ignored.
    #[serde(default)]
    pub chat_history: Option<Vec<Turn>>,
    /// Model identifier such as `ollama/llama2:latest`; blank means default.
    #[serde(default)]
    pub model_name: Option<String>,
}

/// Response payload for POST /converse.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverseResponse {
    pub response: String,
    pub updated_chat_history: Vec<Turn>,
}
