/// Represents the provider (backend) used for large language model (LLM) inference.
///
/// Model identifiers are namespaced by provider, e.g. `ollama/llama2:latest`.
/// The namespace is only meaningful to the backend integration; everything
/// above it treats identifiers as opaque strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Local Ollama runtime for on-device inference.
    Ollama,
}

impl LlmProvider {
    /// Namespace prefix used in model identifiers (without the trailing `/`).
    pub fn prefix(self) -> &'static str {
        match self {
            LlmProvider::Ollama => "ollama",
        }
    }

    /// Builds a namespaced identifier string from a backend-native model name.
    pub fn qualify(self, name: &str) -> String {
        format!("{}/{}", self.prefix(), name)
    }

    /// Strips this provider's namespace from an identifier, if present.
    ///
    /// Identifiers without the prefix are passed through unchanged so that a
    /// bare `llama2` still reaches the backend as `llama2`.
    pub fn native_name<'a>(self, identifier: &'a str) -> &'a str {
        identifier
            .strip_prefix(self.prefix())
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(identifier)
    }
}
