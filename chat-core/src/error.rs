//! Typed errors for the chat-core crate.

use std::path::PathBuf;
use std::time::Duration;

use llm_service::ConfigError;
use thiserror::Error;

/// Boxed underlying cause of a backend failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Why an exchange could not be completed.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The message was empty after trimming whitespace.
    #[error("message must not be empty")]
    EmptyMessage,

    /// A model identifier failed validation.
    #[error("invalid model identifier: {0}")]
    InvalidModel(#[from] ConfigError),

    /// Session ids are used as storage keys and must be path-safe.
    #[error("invalid session id {0:?}: use 1-128 characters from [A-Za-z0-9_-]")]
    InvalidSessionId(String),

    /// Another exchange for the same session has not finished yet.
    #[error("an exchange is already in progress for session {0}")]
    ExchangeInFlight(String),

    /// The inference call itself failed; no reply was produced.
    #[error(transparent)]
    BackendInvocation(#[from] InvocationError),

    /// Explicit history or model operations report storage failures; exchanges
    /// downgrade them to warnings instead.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failure of the inference call. Distinct from a successful call that
/// produced no usable text, which is recovered with a fallback reply.
#[derive(Debug, Error)]
pub enum InvocationError {
    /// The backend could not be reached.
    #[error("inference backend is unreachable: {0}")]
    Unreachable(#[source] BoxError),

    /// The backend rejected the request (unknown model, server error, ...).
    #[error("inference backend returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// No reply within the configured deadline.
    #[error("inference backend did not answer within {0:?}")]
    Timeout(Duration),

    /// Any other transport or client failure.
    #[error("inference backend call failed: {0}")]
    Failed(#[source] BoxError),
}

/// Persistence failures. Always reported as warnings, never fatal.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize session data: {0}")]
    Serialize(#[from] serde_json::Error),
}
