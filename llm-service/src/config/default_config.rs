//! Default LLM config loaded from environment variables.
//!
//! # Environment variables
//!
//! - `OLLAMA_SERVER_ADDRESS` = backend base address (default `http://localhost:11434`)
//! - `OLLAMA_DEFAULT_MODEL`  = identifier used when an exchange names none
//!   (default `ollama/gemma3:1b`)
//! - `LLM_MAX_TOKENS`        = optional max tokens (u32)
//! - `LLM_TEMPERATURE`       = optional temperature (0.0..=2.0)
//! - `OLLAMA_HTTP_TIMEOUT_SECS` = HTTP client timeout (default 600)
//! - `LLM_TIMEOUT_SECS`      = optional caller-side exchange deadline
//!
//! Every loader has a `*_from` twin that takes a lookup function instead of
//! reading the process environment, which keeps tests hermetic.

use crate::{
    config::{
        llm_model_config::LlmModelConfig, llm_provider::LlmProvider,
        model_identifier::ModelIdentifier,
    },
    error_handler::{
        EnvLookup, LlmError, env_opt_f32, env_opt_u32, env_opt_u64, env_or,
        validate_http_endpoint, validate_range_f32,
    },
};

/// Local loopback address and the well-known Ollama port.
pub const DEFAULT_OLLAMA_ADDRESS: &str = "http://localhost:11434";

/// Model used when neither the request nor the environment names one.
pub const DEFAULT_MODEL: &str = "ollama/gemma3:1b";

/// Generation can be slow on local hardware; keep the client patient.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 600;

/// Constructs the chat config from the process environment.
///
/// # Errors
/// See [`config_ollama_chat_from`].
pub fn config_ollama_chat() -> Result<LlmModelConfig, LlmError> {
    config_ollama_chat_from(&|key: &str| std::env::var(key).ok())
}

/// Constructs the chat config from an arbitrary variable lookup.
///
/// # Errors
///
/// - [`crate::ConfigError::InvalidFormat`] if the address lacks an http(s) scheme
/// - [`crate::ConfigError::InvalidNumber`] for unparsable numeric settings
/// - [`crate::ConfigError::OutOfRange`] for a temperature outside `0.0..=2.0`
pub fn config_ollama_chat_from(lookup: EnvLookup<'_>) -> Result<LlmModelConfig, LlmError> {
    let endpoint = env_or(lookup, "OLLAMA_SERVER_ADDRESS", DEFAULT_OLLAMA_ADDRESS);
    validate_http_endpoint("OLLAMA_SERVER_ADDRESS", &endpoint)?;

    let default_model =
        ModelIdentifier::new(env_or(lookup, "OLLAMA_DEFAULT_MODEL", DEFAULT_MODEL))?;

    let max_tokens = env_opt_u32(lookup, "LLM_MAX_TOKENS")?;
    let temperature = env_opt_f32(lookup, "LLM_TEMPERATURE")?;
    if let Some(t) = temperature {
        validate_range_f32("temperature", t, 0.0, 2.0)?;
    }

    let timeout_secs =
        env_opt_u64(lookup, "OLLAMA_HTTP_TIMEOUT_SECS")?.or(Some(DEFAULT_HTTP_TIMEOUT_SECS));
    let exchange_timeout_secs = env_opt_u64(lookup, "LLM_TIMEOUT_SECS")?;

    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        endpoint,
        default_model,
        max_tokens,
        temperature,
        top_p: None,
        timeout_secs,
        exchange_timeout_secs,
    })
}
