//! Conversation turns and the rules for restoring a stored history.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One role-tagged message. Histories are `Vec<Turn>` in conversation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            content: content.into(),
        }
    }
}

/// Rebuilds a history from its stored JSON form.
///
/// Returns `None` when the value is not an array (the stored entry should be
/// discarded). Entries that are not valid turns or whose content is blank are
/// skipped; extra fields such as a UI-side `id` are ignored. Order is kept.
pub fn normalize_history(raw: &Value) -> Option<Vec<Turn>> {
    let entries = raw.as_array()?;
    let mut out = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        match Turn::deserialize(entry) {
            Ok(turn) if !turn.content.trim().is_empty() => out.push(turn),
            Ok(_) => warn!(index = i, "skipping stored turn with blank content"),
            Err(e) => warn!(index = i, error = %e, "skipping unreadable stored turn"),
        }
    }
    Some(out)
}
