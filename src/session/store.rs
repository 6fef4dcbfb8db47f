//! Persisted, capped chat session history
//!
//! [`SessionStore`] owns the active session and the durable history slot.
//! Every append persists the active session; the history is kept
//! most-recently-updated first and truncated to the configured cap.

use super::types::{
    derive_title, ChatSession, Message, Role, SessionId, SessionSummary, DEFAULT_TITLE_MAX_CHARS,
};
use crate::config::HistoryConfig;
use crate::error::{Result, RagdeskError};
use crate::storage::{KeyValueStore, HISTORY_KEY};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Default number of sessions kept in the history
pub const DEFAULT_MAX_SESSIONS: usize = 10;

const EVENT_CAPACITY: usize = 64;

/// Change notification emitted after every store mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A new, empty session became active
    Started(SessionId),
    /// A message was appended to the active session
    MessageAppended {
        /// Session that received the message
        session_id: SessionId,
        /// Position of the message in the log
        index: usize,
    },
    /// The active session was written to the history
    Persisted(SessionId),
    /// Writing the history failed; in-memory state is unchanged
    PersistFailed {
        /// Session that could not be written
        session_id: SessionId,
        /// Human-readable diagnostic
        error: String,
    },
    /// A stored session became the active one
    Resumed(SessionId),
    /// A session was removed from the history
    Deleted(SessionId),
    /// The whole history was wiped
    Cleared,
}

/// Owner of the active chat session and the persisted history
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use ragdesk::session::{Role, SessionStore};
/// use ragdesk::storage::MemoryStore;
///
/// let mut store = SessionStore::new(Arc::new(MemoryStore::new()));
/// store.append_message("What is in the report?", Role::User, vec![], None);
///
/// let history = store.load_history();
/// assert_eq!(history.len(), 1);
/// assert_eq!(history[0].title, "What is in the report?");
/// ```
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    max_sessions: usize,
    title_max_chars: usize,
    current: ChatSession,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    /// Create a store with the default cap and title length
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self::with_limits(storage, DEFAULT_MAX_SESSIONS, DEFAULT_TITLE_MAX_CHARS)
    }

    /// Create a store from the history section of the configuration
    pub fn from_config(storage: Arc<dyn KeyValueStore>, config: &HistoryConfig) -> Self {
        Self::with_limits(storage, config.max_sessions, config.title_max_chars)
    }

    /// Create a store with explicit limits
    pub fn with_limits(
        storage: Arc<dyn KeyValueStore>,
        max_sessions: usize,
        title_max_chars: usize,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            storage,
            max_sessions: max_sessions.max(1),
            title_max_chars,
            current: ChatSession::new(),
            events,
        }
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Identifier of the active session
    pub fn current_id(&self) -> &SessionId {
        &self.current.id
    }

    /// The active session, including messages not yet persisted
    pub fn current_session(&self) -> &ChatSession {
        &self.current
    }

    /// Message log of the active session
    pub fn messages(&self) -> &[Message] {
        &self.current.messages
    }

    /// End the active session and start a new one
    ///
    /// The previous session is persisted when it has messages and silently
    /// discarded otherwise. Persist failures are reported as diagnostics.
    pub fn start_session(&mut self) -> SessionId {
        if !self.current.is_empty() {
            self.persist_or_report();
        }
        self.replace_current(ChatSession::new())
    }

    /// Append a message to the active session and persist it
    ///
    /// A failed write is logged and broadcast as
    /// [`SessionEvent::PersistFailed`]; the message stays in memory.
    pub fn append_message(
        &mut self,
        content: impl Into<String>,
        role: Role,
        sources: Vec<String>,
        runtime_ms: Option<u64>,
    ) -> &Message {
        self.current
            .messages
            .push(Message::new(content, role, sources, runtime_ms));
        let index = self.current.messages.len() - 1;

        if index == 0 {
            self.current.title = derive_title(
                Some(&self.current.messages[0].content),
                self.title_max_chars,
            );
        }

        self.emit(SessionEvent::MessageAppended {
            session_id: self.current.id.clone(),
            index,
        });
        self.persist_or_report();

        &self.current.messages[index]
    }

    /// Write the active session into the history
    ///
    /// Replaces any entry with the same id, moves it to the front and
    /// truncates the history to the cap. Does nothing for an empty session.
    /// A corrupted history is replaced rather than merged.
    ///
    /// # Errors
    ///
    /// Returns `RagdeskError::Persistence` when serialization or the storage
    /// write fails. The in-memory session is not rolled back.
    pub fn persist(&mut self) -> Result<()> {
        if self.current.is_empty() {
            return Ok(());
        }

        self.current.title = derive_title(
            self.current.messages.first().map(|m| m.content.as_str()),
            self.title_max_chars,
        );
        self.current.updated_at = Utc::now();

        let mut history = self.read_history_or_empty();
        history.retain(|session| session.id != self.current.id);
        history.insert(0, self.current.clone());
        if history.len() > self.max_sessions {
            let evicted = history.len() - self.max_sessions;
            history.truncate(self.max_sessions);
            tracing::debug!(evicted, "Evicted oldest sessions from history");
        }

        self.write_history(&history)?;
        tracing::debug!(session_id = %self.current.id, "Persisted session");
        self.emit(SessionEvent::Persisted(self.current.id.clone()));
        Ok(())
    }

    /// Summaries of the stored sessions, most recently updated first
    ///
    /// An unreadable or corrupted history yields an empty list.
    pub fn load_history(&self) -> Vec<SessionSummary> {
        self.read_history_or_empty()
            .iter()
            .map(ChatSession::summary)
            .collect()
    }

    /// Full stored session by id, for replay into the display
    pub fn load_session(&self, id: &SessionId) -> Option<ChatSession> {
        self.read_history_or_empty()
            .into_iter()
            .find(|session| &session.id == id)
    }

    /// Make a stored session the active one
    ///
    /// The current session is persisted first when it has messages. Returns
    /// `false` when no stored session has this id.
    pub fn resume_session(&mut self, id: &SessionId) -> bool {
        if &self.current.id != id && !self.current.is_empty() {
            self.persist_or_report();
        }

        let Some(session) = self.load_session(id) else {
            return false;
        };

        tracing::info!(session_id = %id, messages = session.messages.len(), "Resumed session");
        self.current = session;
        self.emit(SessionEvent::Resumed(id.clone()));
        true
    }

    /// Remove a session from the history
    ///
    /// Deleting the active session discards it and starts a new empty one.
    ///
    /// # Errors
    ///
    /// Returns `RagdeskError::Persistence` when the history cannot be written
    pub fn delete_session(&mut self, id: &SessionId) -> Result<()> {
        let mut history = self.read_history_or_empty();
        history.retain(|session| &session.id != id);
        self.write_history(&history)?;
        self.emit(SessionEvent::Deleted(id.clone()));

        if &self.current.id == id {
            self.replace_current(ChatSession::new());
        }
        Ok(())
    }

    /// Wipe the whole history and start a new empty session
    ///
    /// # Errors
    ///
    /// Returns `RagdeskError::Persistence` when the storage slot cannot be
    /// removed
    pub fn clear_all(&mut self) -> Result<()> {
        self.storage.remove(HISTORY_KEY)?;
        self.emit(SessionEvent::Cleared);
        self.replace_current(ChatSession::new());
        Ok(())
    }

    fn replace_current(&mut self, session: ChatSession) -> SessionId {
        self.current = session;
        let id = self.current.id.clone();
        self.emit(SessionEvent::Started(id.clone()));
        id
    }

    fn persist_or_report(&mut self) {
        if let Err(e) = self.persist() {
            tracing::warn!(session_id = %self.current.id, "Failed to persist session: {:#}", e);
            self.emit(SessionEvent::PersistFailed {
                session_id: self.current.id.clone(),
                error: e.to_string(),
            });
        }
    }

    fn read_history(&self) -> Result<Vec<ChatSession>> {
        match self.storage.get(HISTORY_KEY)? {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| {
                RagdeskError::Persistence(format!("Corrupted session history: {}", e)).into()
            }),
            None => Ok(Vec::new()),
        }
    }

    fn read_history_or_empty(&self) -> Vec<ChatSession> {
        self.read_history().unwrap_or_else(|e| {
            tracing::warn!("Error loading chat history: {:#}", e);
            Vec::new()
        })
    }

    fn write_history(&self, history: &[ChatSession]) -> Result<()> {
        let raw = serde_json::to_string(history)
            .map_err(|e| RagdeskError::Persistence(format!("Serialization failed: {}", e)))?;
        self.storage.set(HISTORY_KEY, &raw)
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine; the front-end may not be listening.
        let _ = self.events.send(event);
    }
}
