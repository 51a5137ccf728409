use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error_handler::ConfigError;

/// Opaque model selector, conventionally `<provider>/<name>`.
///
/// The set of valid identifiers is discovered at runtime from the model
/// directory, so this is a validated string rather than an enum. Validation
/// only guarantees a non-empty value with surrounding whitespace removed.
///
/// # Examples
///
/// ```
/// use llm_service::ModelIdentifier;
///
/// let id: ModelIdentifier = " ollama/gemma3:1b ".parse().unwrap();
/// assert_eq!(id.as_str(), "ollama/gemma3:1b");
/// assert!("   ".parse::<ModelIdentifier>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModelIdentifier(pub(crate) String);

impl ModelIdentifier {
    /// Validates and wraps an identifier.
    ///
    /// # Errors
    /// Returns [`ConfigError::EmptyModel`] when the value is blank.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ConfigError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ConfigError::EmptyModel);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ModelIdentifier {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ModelIdentifier {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ModelIdentifier> for String {
    fn from(value: ModelIdentifier) -> Self {
        value.0
    }
}

impl AsRef<str> for ModelIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_rejects_blank() {
        let id = ModelIdentifier::new("ollama/gemma3:1b ").unwrap();
        assert_eq!(id.as_str(), "ollama/gemma3:1b");
        assert!(matches!(
            ModelIdentifier::new(" \t"),
            Err(ConfigError::EmptyModel)
        ));
    }

    #[test]
    fn serde_is_a_plain_string() {
        let id: ModelIdentifier = serde_json::from_str("\"ollama/mistral\"").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"ollama/mistral\"");
        assert!(serde_json::from_str::<ModelIdentifier>("\"\"").is_err());
    }
}
