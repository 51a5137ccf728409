use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chat_core::{
    ChatSessions, InferenceBackend, JsonFileSessionStore, Orchestrator, SessionStore,
};
use llm_service::{
    LlmError, LlmModelConfig, ModelDirectory,
    config::default_config::config_ollama_chat_from,
    error_handler::{EnvLookup, env_or},
    services::ollama_service::OllamaService,
};
use tracing::info;

use crate::error_handler::AppResult;

pub const DEFAULT_API_ADDRESS: &str = "127.0.0.1:9002";
pub const DEFAULT_STORE_DIR: &str = "./chat_sessions";

/// HTTP-side settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// `host:port` to bind, from `API_ADDRESS`.
    pub address: String,
    /// Root of the JSON session store, from `CHAT_STORE_DIR`.
    pub store_dir: PathBuf,
}

impl ApiConfig {
    pub fn from_lookup(lookup: EnvLookup<'_>) -> Self {
        Self {
            address: env_or(lookup, "API_ADDRESS", DEFAULT_API_ADDRESS),
            store_dir: PathBuf::from(env_or(lookup, "CHAT_STORE_DIR", DEFAULT_STORE_DIR)),
        }
    }
}

/// Shared state for all HTTP handlers.
pub struct AppState {
    pub api: ApiConfig,
    /// Backend settings, read-only after start.
    pub llm: LlmModelConfig,
    pub directory: ModelDirectory,
    pub sessions: ChatSessions,
}

impl AppState {
    /// Load shared state from environment variables.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    /// Same as [`AppState::from_env`] with an explicit variable lookup.
    pub fn from_lookup(lookup: EnvLookup<'_>) -> AppResult<Self> {
        let llm = config_ollama_chat_from(lookup)?;
        let api = ApiConfig::from_lookup(lookup);
        let store = Arc::new(JsonFileSessionStore::new(api.store_dir.clone()));
        Self::with_store(api, llm, store)
    }

    /// Wires the Ollama backend and the given store together.
    pub fn with_store(
        api: ApiConfig,
        llm: LlmModelConfig,
        store: Arc<dyn SessionStore>,
    ) -> AppResult<Self> {
        let backend = OllamaService::new(llm.clone()).map_err(LlmError::from)?;
        Self::with_backend(api, llm, Arc::new(backend), store)
    }

    pub fn with_backend(
        api: ApiConfig,
        llm: LlmModelConfig,
        backend: Arc<dyn InferenceBackend>,
        store: Arc<dyn SessionStore>,
    ) -> AppResult<Self> {
        let directory = ModelDirectory::new(&llm, None)?;
        let orchestrator = Orchestrator::new(backend, llm.default_model.clone())
            .with_timeout(llm.exchange_timeout_secs.map(Duration::from_secs));

        info!(
            endpoint = %llm.base_url(),
            default_model = %llm.default_model,
            store_dir = %api.store_dir.display(),
            "application state ready"
        );

        Ok(Self {
            api,
            llm,
            directory,
            sessions: ChatSessions::new(orchestrator, store),
        })
    }
}
