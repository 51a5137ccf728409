//! Session manager: persistence around the orchestrator plus the
//! one-exchange-at-a-time rule.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};

use llm_service::ModelIdentifier;
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, instrument, warn};

use crate::error::{ChatError, StorageError};
use crate::orchestrator::{ExchangeResult, Orchestrator};
use crate::store::{SessionId, SessionStore};
use crate::turn::Turn;

/// Non-fatal problem met while serving a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionWarning {
    pub kind: &'static str,
    pub message: String,
}

impl SessionWarning {
    fn storage(kind: &'static str, what: &str, err: &StorageError) -> Self {
        Self {
            kind,
            message: format!("{what}: {err}"),
        }
    }
}

/// A completed exchange as seen by a session.
#[derive(Debug, Clone, Serialize)]
pub struct ExchangeOutcome {
    pub result: ExchangeResult,
    /// The model the exchange actually ran on.
    pub model: ModelIdentifier,
    pub warnings: Vec<SessionWarning>,
}

type LockMap = HashMap<SessionId, Arc<Mutex<()>>>;

/// Exclusive claim on one session. Dropping it releases the session and
/// forgets its lock once nobody else holds a handle to it.
struct SessionClaim<'a> {
    locks: &'a StdMutex<LockMap>,
    session: SessionId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SessionClaim<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = lock_map(self.locks);
        if locks
            .get(&self.session)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.session);
        }
    }
}

/// Map critical sections never panic midway, so a poisoned map is still consistent.
fn lock_map(locks: &StdMutex<LockMap>) -> MutexGuard<'_, LockMap> {
    locks.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct ChatSessions {
    orchestrator: Orchestrator,
    store: Arc<dyn SessionStore>,
    /// Only sessions with a pending operation have an entry.
    locks: StdMutex<LockMap>,
}

impl ChatSessions {
    pub fn new(orchestrator: Orchestrator, store: Arc<dyn SessionStore>) -> Self {
        Self {
            orchestrator,
            store,
            locks: StdMutex::new(HashMap::new()),
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Takes the session without waiting; a busy session is an error.
    fn claim(&self, session: &SessionId) -> Result<SessionClaim<'_>, ChatError> {
        let guard = lock_map(&self.locks)
            .entry(session.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
            .try_lock_owned()
            .map_err(|_| ChatError::ExchangeInFlight(session.to_string()))?;
        Ok(SessionClaim {
            locks: &self.locks,
            session: session.clone(),
            guard: Some(guard),
        })
    }

    #[cfg(test)]
    fn tracked_sessions(&self) -> usize {
        lock_map(&self.locks).len()
    }

    /// Runs one exchange for `session` and persists its result.
    ///
    /// Model resolution: `model` if given, else the session's stored selection,
    /// else the orchestrator default. Only an explicit `model` is stored as the
    /// new selection, so a selection made while the exchange runs survives it.
    /// Storage problems become warnings.
    ///
    /// # Errors
    /// - [`ChatError::EmptyMessage`] for a blank message
    /// - [`ChatError::ExchangeInFlight`] if this session already has a pending exchange
    /// - [`ChatError::BackendInvocation`] if the backend failed; nothing is persisted
    #[instrument(skip_all, fields(session = %session))]
    pub async fn send(
        &self,
        session: &SessionId,
        message: &str,
        model: Option<&ModelIdentifier>,
    ) -> Result<ExchangeOutcome, ChatError> {
        if message.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let _claim = self.claim(session)?;
        let mut warnings = Vec::new();

        let history = match self.store.load_history(session).await {
            Ok(history) => history.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "could not load history; starting empty");
                warnings.push(SessionWarning::storage("storage_load", "history", &e));
                Vec::new()
            }
        };

        let requested = model;
        let model = match requested {
            Some(m) => m.clone(),
            None => match self.store.load_selected_model(session).await {
                Ok(Some(stored)) => stored,
                Ok(None) => self.orchestrator.default_model().clone(),
                Err(e) => {
                    warn!(error = %e, "could not load selected model; using default");
                    warnings.push(SessionWarning::storage("storage_load", "selected model", &e));
                    self.orchestrator.default_model().clone()
                }
            },
        };

        let result = self
            .orchestrator
            .converse(message, &history, Some(&model))
            .await?;

        if let Err(e) = self
            .store
            .save_history(session, &result.updated_history)
            .await
        {
            warn!(error = %e, "could not persist history");
            warnings.push(SessionWarning::storage("storage_save", "history", &e));
        }
        if let Some(chosen) = requested {
            if let Err(e) = self.store.save_selected_model(session, chosen).await {
                warn!(error = %e, "could not persist selected model");
                warnings.push(SessionWarning::storage("storage_save", "selected model", &e));
            }
        }

        info!(
            %model,
            turns = result.updated_history.len(),
            warnings = warnings.len(),
            "session exchange stored"
        );
        Ok(ExchangeOutcome {
            result,
            model,
            warnings,
        })
    }

    pub async fn history(&self, session: &SessionId) -> Result<Vec<Turn>, ChatError> {
        Ok(self.store.load_history(session).await?.unwrap_or_default())
    }

    /// Drops the stored history. Refused while an exchange is pending, since
    /// that exchange would write its history back afterwards.
    pub async fn clear(&self, session: &SessionId) -> Result<(), ChatError> {
        let _claim = self.claim(session)?;
        self.store.clear_history(session).await?;
        info!(%session, "history cleared");
        Ok(())
    }

    pub async fn selected_model(
        &self,
        session: &SessionId,
    ) -> Result<Option<ModelIdentifier>, ChatError> {
        Ok(self.store.load_selected_model(session).await?)
    }

    pub async fn select_model(
        &self,
        session: &SessionId,
        model: &ModelIdentifier,
    ) -> Result<(), ChatError> {
        self.store.save_selected_model(session, model).await?;
        info!(%session, %model, "model selected");
        Ok(())
    }
}
