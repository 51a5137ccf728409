//! HTTP surface of the chat gateway.

use std::sync::Arc;

mod core;
mod error_handler;
mod routes;

pub use crate::core::app_state::{ApiConfig, AppState};
pub use crate::error_handler::{AppError, AppResult};

use axum::{
    Router,
    routing::{get, post},
};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::routes::{
    converse::converse_route::converse,
    models::{list_models_route::list_models, ollama_models_route::ollama_models},
    sessions::{
        session_history_route::{clear_history, get_history},
        session_messages_route::send_message,
        session_model_route::{get_model, put_model},
    },
};

/// Builds the router with all routes and middleware attached.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ollama-models", get(ollama_models))
        .route("/models", get(list_models))
        .route("/converse", post(converse))
        .route("/sessions/{id}/messages", post(send_message))
        .route(
            "/sessions/{id}/history",
            get(get_history).delete(clear_history),
        )
        .route("/sessions/{id}/model", get(get_model).put(put_model))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `state.api.address` and serves until Ctrl+C.
pub async fn start(state: AppState) -> AppResult<()> {
    let addr = state.api.address.clone();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| AppError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!(%addr, "chat gateway listening");

    axum::serve(listener, router(Arc::new(state)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("chat gateway stopped");
    Ok(())
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        // Without a signal handler the server keeps running until killed.
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
