//! Persisted UI preferences
//!
//! Only one flag exists today: whether the history sidebar is collapsed.
//! It lives under its own storage key and never touches session data.

use crate::error::Result;
use crate::storage::{KeyValueStore, SIDEBAR_COLLAPSED_KEY};
use std::sync::Arc;

/// Accessor for the persisted preference flags
pub struct Preferences {
    storage: Arc<dyn KeyValueStore>,
}

impl Preferences {
    /// Wrap a storage backend
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Whether the sidebar is collapsed
    ///
    /// Missing, unreadable or unrecognized values read as `false`.
    pub fn sidebar_collapsed(&self) -> bool {
        match self.storage.get(SIDEBAR_COLLAPSED_KEY) {
            Ok(Some(value)) => value.trim() == "true",
            Ok(None) => false,
            Err(e) => {
                tracing::warn!("Failed to read sidebar preference: {:#}", e);
                false
            }
        }
    }

    /// Persist the sidebar collapse state
    pub fn set_sidebar_collapsed(&self, collapsed: bool) -> Result<()> {
        self.storage
            .set(SIDEBAR_COLLAPSED_KEY, if collapsed { "true" } else { "false" })
    }

    /// Flip the sidebar collapse state and return the new value
    pub fn toggle_sidebar(&self) -> Result<bool> {
        let collapsed = !self.sidebar_collapsed();
        self.set_sidebar_collapsed(collapsed)?;
        Ok(collapsed)
    }
}
