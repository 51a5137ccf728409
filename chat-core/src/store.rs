//! Session persistence: the [`SessionStore`] seam plus memory and JSON-file stores.
//!
//! Each session keeps two entries, mirroring a browser key-value store:
//! - [`HISTORY_KEY`]: JSON array of turns
//! - [`MODEL_KEY`]: last selected model identifier as plain text

use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use llm_service::ModelIdentifier;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{ChatError, StorageError};
use crate::turn::{Turn, normalize_history};

pub const HISTORY_KEY: &str = "ollamaChatHistory";
pub const MODEL_KEY: &str = "ollamaSelectedModel";

/// Path-safe session key: 1-128 characters from `[A-Za-z0-9_-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// # Errors
    /// Returns [`ChatError::InvalidSessionId`] for empty, overlong or unsafe ids.
    pub fn new(raw: impl Into<String>) -> Result<Self, ChatError> {
        let raw = raw.into();
        let ok = !raw.is_empty()
            && raw.len() <= 128
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if ok {
            Ok(Self(raw))
        } else {
            Err(ChatError::InvalidSessionId(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Best-effort persistence of one history and one model choice per session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// `Ok(None)` when nothing (usable) is stored.
    async fn load_history(&self, session: &SessionId) -> Result<Option<Vec<Turn>>, StorageError>;

    async fn save_history(
        &self,
        session: &SessionId,
        history: &[Turn],
    ) -> Result<(), StorageError>;

    async fn clear_history(&self, session: &SessionId) -> Result<(), StorageError>;

    async fn load_selected_model(
        &self,
        session: &SessionId,
    ) -> Result<Option<ModelIdentifier>, StorageError>;

    async fn save_selected_model(
        &self,
        session: &SessionId,
        model: &ModelIdentifier,
    ) -> Result<(), StorageError>;
}

/* --------------------------- memory --------------------------- */

#[derive(Default)]
struct MemoryEntry {
    history: Option<Vec<Turn>>,
    model: Option<ModelIdentifier>,
}

/// Process-local store; contents vanish with the process.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<SessionId, MemoryEntry>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load_history(&self, session: &SessionId) -> Result<Option<Vec<Turn>>, StorageError> {
        Ok(self
            .entries
            .read()
            .await
            .get(session)
            .and_then(|e| e.history.clone()))
    }

    async fn save_history(
        &self,
        session: &SessionId,
        history: &[Turn],
    ) -> Result<(), StorageError> {
        self.entries
            .write()
            .await
            .entry(session.clone())
            .or_default()
            .history = Some(history.to_vec());
        Ok(())
    }

    async fn clear_history(&self, session: &SessionId) -> Result<(), StorageError> {
        if let Some(e) = self.entries.write().await.get_mut(session) {
            e.history = None;
        }
        Ok(())
    }

    async fn load_selected_model(
        &self,
        session: &SessionId,
    ) -> Result<Option<ModelIdentifier>, StorageError> {
        Ok(self
            .entries
            .read()
            .await
            .get(session)
            .and_then(|e| e.model.clone()))
    }

    async fn save_selected_model(
        &self,
        session: &SessionId,
        model: &ModelIdentifier,
    ) -> Result<(), StorageError> {
        self.entries
            .write()
            .await
            .entry(session.clone())
            .or_default()
            .model = Some(model.clone());
        Ok(())
    }
}

/* ---------------------------- files ---------------------------- */

/// One directory per session under `root`, one file per key.
///
/// Writes go to a temp file that is renamed into place, so a crash never
/// leaves a half-written history behind.
pub struct JsonFileSessionStore {
    root: PathBuf,
}

impl JsonFileSessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn history_path(&self, session: &SessionId) -> PathBuf {
        self.root
            .join(session.as_str())
            .join(format!("{HISTORY_KEY}.json"))
    }

    fn model_path(&self, session: &SessionId) -> PathBuf {
        self.root.join(session.as_str()).join(MODEL_KEY)
    }

    async fn read_optional(path: &Path) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(path).await {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(io_err(path, source)),
        }
    }

    async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StorageError> {
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| io_err(dir, e))?;
        }
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, contents)
            .await
            .map_err(|e| io_err(&tmp, e))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| io_err(path, e))?;
        debug!(path = %path.display(), bytes = contents.len(), "session entry written");
        Ok(())
    }

    async fn remove_optional(path: &Path) -> Result<(), StorageError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(io_err(path, source)),
        }
    }
}

fn io_err(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[async_trait]
impl SessionStore for JsonFileSessionStore {
    async fn load_history(&self, session: &SessionId) -> Result<Option<Vec<Turn>>, StorageError> {
        let path = self.history_path(session);
        let Some(text) = Self::read_optional(&path).await? else {
            return Ok(None);
        };

        let restored = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|raw| normalize_history(&raw));
        if restored.is_none() {
            warn!(path = %path.display(), "stored history is not a JSON array; discarding it");
            Self::remove_optional(&path).await?;
        }
        Ok(restored)
    }

    async fn save_history(
        &self,
        session: &SessionId,
        history: &[Turn],
    ) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(history)?;
        Self::write_atomic(&self.history_path(session), &bytes).await
    }

    async fn clear_history(&self, session: &SessionId) -> Result<(), StorageError> {
        Self::remove_optional(&self.history_path(session)).await
    }

    async fn load_selected_model(
        &self,
        session: &SessionId,
    ) -> Result<Option<ModelIdentifier>, StorageError> {
        let text = Self::read_optional(&self.model_path(session)).await?;
        Ok(text.and_then(|t| ModelIdentifier::new(t).ok()))
    }

    async fn save_selected_model(
        &self,
        session: &SessionId,
        model: &ModelIdentifier,
    ) -> Result<(), StorageError> {
        Self::write_atomic(&self.model_path(session), model.as_str().as_bytes()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(s: &str) -> SessionId {
        SessionId::new(s).unwrap()
    }

    #[test]
    fn session_ids_must_be_path_safe() {
        assert!(SessionId::new("abc-123_XYZ").is_ok());
        let overlong = "x".repeat(129);
        for bad in ["", "../etc", "a/b", "with space", overlong.as_str()] {
            assert!(
                matches!(SessionId::new(bad), Err(ChatError::InvalidSessionId(_))),
                "{bad:?}"
            );
        }
    }

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemorySessionStore::new();
        let s = sid("s1");
        assert_eq!(store.load_history(&s).await.unwrap(), None);

        let history = vec![Turn::user("a"), Turn::model("b")];
        store.save_history(&s, &history).await.unwrap();
        store
            .save_selected_model(&s, &ModelIdentifier::new("ollama/mistral").unwrap())
            .await
            .unwrap();

        assert_eq!(store.load_history(&s).await.unwrap(), Some(history));
        assert_eq!(
            store.load_selected_model(&s).await.unwrap().unwrap().as_str(),
            "ollama/mistral"
        );

        store.clear_history(&s).await.unwrap();
        assert_eq!(store.load_history(&s).await.unwrap(), None);
        assert!(store.load_selected_model(&s).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn file_store_uses_key_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSessionStore::new(dir.path());
        let s = sid("alpha");

        store
            .save_history(&s, &[Turn::user("hello"), Turn::model("hi")])
            .await
            .unwrap();
        store
            .save_selected_model(&s, &ModelIdentifier::new("ollama/llama2").unwrap())
            .await
            .unwrap();

        let history_file = dir.path().join("alpha").join("ollamaChatHistory.json");
        let raw: Value =
            serde_json::from_str(&std::fs::read_to_string(&history_file).unwrap()).unwrap();
        assert_eq!(raw[0]["role"], "user");
        assert_eq!(raw[1]["content"], "hi");

        let model_file = dir.path().join("alpha").join("ollamaSelectedModel");
        assert_eq!(std::fs::read_to_string(model_file).unwrap(), "ollama/llama2");

        assert_eq!(store.load_history(&s).await.unwrap().unwrap().len(), 2);
        assert!(!history_file.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn file_store_discards_non_array_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSessionStore::new(dir.path());
        let s = sid("broken");
        let path = dir.path().join("broken").join("ollamaChatHistory.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();

        std::fs::write(&path, r#"{"role":"user"}"#).unwrap();
        assert_eq!(store.load_history(&s).await.unwrap(), None);
        assert!(!path.exists());

        std::fs::write(&path, "{{ not json").unwrap();
        assert_eq!(store.load_history(&s).await.unwrap(), None);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn file_store_tolerates_missing_and_blank_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSessionStore::new(dir.path());
        let s = sid("fresh");

        assert_eq!(store.load_history(&s).await.unwrap(), None);
        assert_eq!(store.load_selected_model(&s).await.unwrap(), None);
        store.clear_history(&s).await.unwrap();

        let model_file = dir.path().join("fresh").join("ollamaSelectedModel");
        std::fs::create_dir_all(model_file.parent().unwrap()).unwrap();
        std::fs::write(&model_file, "  \n").unwrap();
        assert_eq!(store.load_selected_model(&s).await.unwrap(), None);
    }
}
