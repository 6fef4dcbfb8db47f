//! Durable key-value storage
//!
//! The session store and the preference flag both persist through the
//! [`KeyValueStore`] trait, so the backend can be swapped without touching
//! the state machines: [`MemoryStore`] for tests and embedding,
//! [`SqliteStore`] for the command-line front-end.

use crate::error::{Result, RagdeskError};
use std::collections::HashMap;
use std::sync::Mutex;

pub mod sqlite;
pub use sqlite::SqliteStore;

/// Key under which the serialized chat session history is stored
pub const HISTORY_KEY: &str = "ragChatHistory";

/// Key under which the sidebar collapse flag is stored
pub const SIDEBAR_COLLAPSED_KEY: &str = "sidebarCollapsed";

/// A durable slot store addressed by string keys
///
/// Values are opaque strings (JSON in practice). Implementations must treat
/// `set` as a whole-value replacement and `remove` as idempotent.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, or `None` when the key is unset
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing an unset key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory [`KeyValueStore`]
///
/// An optional quota caps the total number of stored bytes (keys plus
/// values); writes that would exceed it fail the way a full browser storage
/// quota does.
///
/// # Examples
///
/// ```
/// use ragdesk::storage::{KeyValueStore, MemoryStore};
///
/// let store = MemoryStore::new();
/// store.set("greeting", "hello").unwrap();
/// assert_eq!(store.get("greeting").unwrap().as_deref(), Some("hello"));
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    /// Create an unbounded store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects writes once `quota_bytes` would be exceeded
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries.lock().map_err(|_| {
            RagdeskError::Persistence("Memory store lock was poisoned".to_string()).into()
        })
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.lock()?;

        if let Some(quota) = self.quota_bytes {
            let used: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = used + key.len() + value.len();
            if needed > quota {
                return Err(RagdeskError::Persistence(format!(
                    "Storage quota exceeded: {} of {} bytes",
                    needed, quota
                ))
                .into());
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}
