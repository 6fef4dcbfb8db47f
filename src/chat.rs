//! Question submission flow
//!
//! [`ChatClient`] ties the [`SessionStore`] to a [`QueryApi`]: the question
//! is recorded as a user message before the request goes out, and the
//! answer (or an apology, on failure) is recorded as a bot message.

use crate::api::QueryApi;
use crate::config::HistoryConfig;
use crate::error::{Result, RagdeskError};
use crate::session::{Message, Role, SessionStore};
use std::sync::Arc;

/// Bot message recorded when the query service cannot be reached
pub const APOLOGY_MESSAGE: &str = "Sorry, something went wrong. Please try again.";

/// Default number of retrieval chunks requested per question
pub const DEFAULT_NUM_CHUNKS: u32 = 10;

/// Chat front-end core: session history plus the query service
pub struct ChatClient {
    store: SessionStore,
    api: Arc<dyn QueryApi>,
    num_chunks: u32,
}

impl ChatClient {
    pub fn new(store: SessionStore, api: Arc<dyn QueryApi>) -> Self {
        Self {
            store,
            api,
            num_chunks: DEFAULT_NUM_CHUNKS,
        }
    }

    /// Create a client using the configured chunk count
    pub fn from_config(store: SessionStore, api: Arc<dyn QueryApi>, config: &HistoryConfig) -> Self {
        Self::new(store, api).with_num_chunks(config.num_chunks)
    }

    pub fn with_num_chunks(mut self, num_chunks: u32) -> Self {
        self.num_chunks = num_chunks;
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SessionStore {
        &mut self.store
    }

    /// Ask a question in the active session
    ///
    /// Returns the bot message holding the answer.
    ///
    /// # Errors
    ///
    /// Returns `RagdeskError::Validation` for a blank question (nothing is
    /// recorded), or the query error after recording [`APOLOGY_MESSAGE`]
    pub async fn ask(&mut self, question: &str) -> Result<Message> {
        let question = question.trim();
        if question.is_empty() {
            return Err(RagdeskError::Validation("Question must not be empty".to_string()).into());
        }

        self.store
            .append_message(question, Role::User, Vec::new(), None);

        match self.api.query(question, self.num_chunks).await {
            Ok(response) => {
                if response.low_confidence == Some(true) {
                    tracing::info!("Answer flagged as low confidence");
                }
                let message = self.store.append_message(
                    response.answer,
                    Role::Bot,
                    response.sources,
                    response.runtime_ms,
                );
                Ok(message.clone())
            }
            Err(e) => {
                tracing::error!("Error querying documents: {:#}", e);
                self.store
                    .append_message(APOLOGY_MESSAGE, Role::Bot, Vec::new(), None);
                Err(e)
            }
        }
    }
}
