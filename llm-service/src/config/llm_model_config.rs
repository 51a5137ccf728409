use crate::config::{llm_provider::LlmProvider, model_identifier::ModelIdentifier};

/// Configuration for talking to the inference backend.
///
/// This struct is process-wide and read-only after startup. The model named
/// here is only the *default*; each exchange may select another identifier.
///
/// # Fields
///
/// - `provider`: Which LLM provider/backend to use (currently only Ollama).
/// - `endpoint`: Base address of the inference server, e.g. `http://localhost:11434`.
/// - `default_model`: Identifier used when an exchange does not name one.
/// - `max_tokens`: Maximum number of tokens to generate (if supported).
/// - `temperature`: Controls randomness (0.0 = deterministic, >1.0 = more random).
/// - `top_p`: Nucleus sampling cutoff (alternative to temperature).
/// - `timeout_secs`: HTTP client timeout for generation requests.
/// - `exchange_timeout_secs`: Optional caller-side deadline for a whole exchange.
///
/// # Examples
///
/// ```
/// use llm_service::{LlmModelConfig, LlmProvider, ModelIdentifier};
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::Ollama,
///     endpoint: "http://localhost:11434".to_string(),
///     default_model: ModelIdentifier::new("ollama/gemma3:1b").unwrap(),
///     max_tokens: None,
///     temperature: None,
///     top_p: None,
///     timeout_secs: Some(600),
///     exchange_timeout_secs: None,
/// };
/// assert_eq!(cfg.base_url(), "http://localhost:11434");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The LLM provider/backend.
    pub provider: LlmProvider,

    /// Inference server base address.
    pub endpoint: String,

    /// Fallback model identifier.
    pub default_model: ModelIdentifier,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature (controls creativity).
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,

    /// Optional deadline for one exchange, enforced above the HTTP client.
    pub exchange_timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    /// Endpoint without trailing slashes, ready for path concatenation.
    pub fn base_url(&self) -> &str {
        self.endpoint.trim().trim_end_matches('/')
    }
}
