//! In-process stand-ins for an Ollama server.

use axum::Router;
use tokio::net::TcpListener;

use crate::config::{
    llm_model_config::LlmModelConfig, llm_provider::LlmProvider,
    model_identifier::ModelIdentifier,
};

/// Serves `app` on an ephemeral loopback port and returns its base URL.
pub async fn spawn_fake_ollama(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Base URL of a loopback port nothing is listening on.
pub async fn unused_local_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn config_for(base: &str) -> LlmModelConfig {
    LlmModelConfig {
        provider: LlmProvider::Ollama,
        endpoint: base.to_string(),
        default_model: ModelIdentifier::new("ollama/gemma3:1b").unwrap(),
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs: Some(5),
        exchange_timeout_secs: None,
    }
}
