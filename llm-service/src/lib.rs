//! Ollama-facing services for the chat gateway.
//!
//! - [`services::ollama_service::OllamaService`] talks to `/api/generate`.
//! - [`model_directory::ModelDirectory`] lists loaded models via `/api/tags`
//!   and applies the default-list fallback policy.
//! - [`config`] reads the process-wide configuration from the environment.
//! - [`error_handler`] holds the unified error taxonomy.
//! - [`telemetry`] installs the gateway's `tracing` subscriber.

pub mod config;
pub mod error_handler;
pub mod model_directory;
pub mod services;
pub mod telemetry;

#[cfg(test)]
mod test_support;

pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use config::model_identifier::ModelIdentifier;
pub use error_handler::{ConfigError, DirectoryError, LlmError};
pub use model_directory::{ModelDescriptor, ModelDirectory, ModelListing};
