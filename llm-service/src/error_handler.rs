//! Unified error handling for `llm-service`.
//!
//! This module exposes a single top-level error type [`LlmError`] for the whole
//! library, and groups domain-specific errors in nested enums ([`ConfigError`],
//! [`DirectoryError`]). Small helpers for reading/validating environment
//! variables are provided and return the unified [`Result<T>`] alias.
//!
//! All messages include the prefix `[LLM Service]` to simplify attribution in logs.

use thiserror::Error;

use crate::services::ollama_service::OllamaError;

/* ------------------------------------------------------------------------- */
/* Public result alias                                                       */
/* ------------------------------------------------------------------------- */

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Variable lookup used by config loaders (`std::env::var` in production).
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/* ------------------------------------------------------------------------- */
/* Top-level error                                                           */
/* ------------------------------------------------------------------------- */

/// Top-level error for the `llm-service` crate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum LlmError {
    /// Configuration/validation errors (startup only).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Model listing failures.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// Generation failures from the Ollama client.
    #[error(transparent)]
    Ollama(#[from] OllamaError),

    /// Underlying HTTP transport error (e.g., client construction).
    #[error("[LLM Service] transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),
}

/* ------------------------------------------------------------------------- */
/* Config errors                                                             */
/* ------------------------------------------------------------------------- */

/// Error enum for environment/config-driven setup.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A number failed to parse (like ports, limits, timeouts).
    #[error("[LLM Service] invalid number in {var}: {reason}")]
    InvalidNumber {
        /// Variable name (e.g., `LLM_MAX_TOKENS`).
        var: &'static str,
        /// Human-readable reason (e.g., `expected u32`).
        reason: &'static str,
    },

    /// Value had the wrong format (e.g., invalid URL).
    #[error("[LLM Service] invalid format in {var}: {reason}")]
    InvalidFormat {
        /// Variable name (e.g., `OLLAMA_SERVER_ADDRESS`).
        var: &'static str,
        /// Explanation (e.g., `must start with http:// or https://`).
        reason: &'static str,
    },

    /// A numeric field was outside of the allowed range.
    #[error("[LLM Service] {field} is out of range: {detail}")]
    OutOfRange {
        /// Field name (e.g., `temperature`).
        field: &'static str,
        /// Description of the expected range.
        detail: &'static str,
    },

    /// Model identifier was empty.
    #[error("[LLM Service] model identifier must not be empty")]
    EmptyModel,
}

/* ------------------------------------------------------------------------- */
/* Directory errors                                                          */
/* ------------------------------------------------------------------------- */

/// Ways a model listing can fail. None of them is fatal: callers degrade to
/// the built-in default list.
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    /// The backend could not be reached at all.
    #[error("[LLM Service] Ollama server is not running or is not accessible at {url}: {reason}")]
    Unreachable {
        /// Listing URL that was attempted.
        url: String,
        /// Transport error rendered as text.
        reason: String,
    },

    /// The backend answered with a non-success status.
    #[error("[LLM Service] Ollama returned HTTP {status}: {message}")]
    BackendError {
        /// Numeric HTTP status code.
        status: u16,
        /// Error text supplied by the backend, or a generic message.
        message: String,
    },

    /// The backend answered 2xx but the body did not have the expected shape.
    #[error("[LLM Service] unexpected response format from Ollama server: {0}")]
    MalformedResponse(String),
}

impl DirectoryError {
    /// Stable machine-readable classification.
    pub fn kind(&self) -> &'static str {
        match self {
            DirectoryError::Unreachable { .. } => "unreachable",
            DirectoryError::BackendError { .. } => "backend_error",
            DirectoryError::MalformedResponse(_) => "malformed_response",
        }
    }
}

/* ------------------------------------------------------------------------- */
/* Env helpers                                                               */
/* ------------------------------------------------------------------------- */

/// Returns the variable's value, or `default` when it is unset or blank.
pub fn env_or(lookup: EnvLookup<'_>, name: &str, default: &str) -> String {
    match lookup(name) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => default.to_string(),
    }
}

/// Parses an optional `u32` (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`ConfigError::InvalidNumber`] if the variable is set but not a valid `u32`.
pub fn env_opt_u32(lookup: EnvLookup<'_>, name: &'static str) -> Result<Option<u32>> {
    env_opt_parse(lookup, name, "expected u32")
}

/// Parses an optional `u64` (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`ConfigError::InvalidNumber`] if the variable is set but not a valid `u64`.
pub fn env_opt_u64(lookup: EnvLookup<'_>, name: &'static str) -> Result<Option<u64>> {
    env_opt_parse(lookup, name, "expected u64")
}

/// Parses an optional `f32` (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`ConfigError::InvalidNumber`] if the variable is set but not a valid `f32`.
pub fn env_opt_f32(lookup: EnvLookup<'_>, name: &'static str) -> Result<Option<f32>> {
    env_opt_parse(lookup, name, "expected a decimal number")
}

fn env_opt_parse<T: std::str::FromStr>(
    lookup: EnvLookup<'_>,
    name: &'static str,
    reason: &'static str,
) -> Result<Option<T>> {
    match lookup(name) {
        Some(v) if !v.trim().is_empty() => v
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| LlmError::from(ConfigError::InvalidNumber { var: name, reason })),
        _ => Ok(None),
    }
}

/* ------------------------------------------------------------------------- */
/* Validation helpers                                                        */
/* ------------------------------------------------------------------------- */

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
///
/// # Errors
/// Returns [`ConfigError::InvalidFormat`] when the string does not start with
/// a valid HTTP scheme.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        }
        .into())
    }
}

/// Validates that a floating-point value lies within an inclusive range.
///
/// # Errors
/// Returns [`ConfigError::OutOfRange`] if `value` is outside `[min, max]`.
pub fn validate_range_f32(field: &'static str, value: f32, min: f32, max: f32) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            detail: "expected value in inclusive range",
        }
        .into())
    }
}

/// Short, single-line excerpt of a response body for logs and error messages.
pub fn make_snippet(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    flat.chars().take(240).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_is_flat_and_bounded() {
        let body = format!("line one\n\tline two {}", "x".repeat(500));
        let s = make_snippet(&body);
        assert!(s.starts_with("line one line two "));
        assert_eq!(s.chars().count(), 240);
    }

    #[test]
    fn directory_error_kinds_are_stable() {
        let unreachable = DirectoryError::Unreachable {
            url: "http://localhost:11434/api/tags".into(),
            reason: "connection refused".into(),
        };
        assert_eq!(unreachable.kind(), "unreachable");
        assert_eq!(
            DirectoryError::BackendError {
                status: 404,
                message: "nope".into()
            }
            .kind(),
            "backend_error"
        );
        assert_eq!(
            DirectoryError::MalformedResponse("no models".into()).kind(),
            "malformed_response"
        );
    }
}
