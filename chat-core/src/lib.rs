//! Conversation orchestration for the chat gateway.
//!
//! The [`Orchestrator`] turns `(message, history, model)` into a reply and an
//! extended history through an injected [`InferenceBackend`]. [`ChatSessions`]
//! layers per-session persistence (via a [`SessionStore`]) and the
//! one-exchange-at-a-time rule on top of it.

pub mod backend;
pub mod error;
pub mod orchestrator;
pub mod prompt;
pub mod sessions;
pub mod store;
pub mod turn;

pub use backend::{InferenceBackend, InferenceRequest, RawOutput};
pub use error::{ChatError, InvocationError, StorageError};
pub use orchestrator::{ExchangeResult, FALLBACK_RESPONSE, Orchestrator};
pub use sessions::{ChatSessions, ExchangeOutcome, SessionWarning};
pub use store::{JsonFileSessionStore, MemorySessionStore, SessionId, SessionStore};
pub use turn::{Role, Turn};
