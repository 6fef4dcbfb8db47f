use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Title shown for a session that has no first message yet
pub const DEFAULT_TITLE: &str = "New Chat";

/// Marker appended to a truncated title
pub const ELLIPSIS: &str = "...";

/// Default maximum title length in characters, ellipsis included
pub const DEFAULT_TITLE_MAX_CHARS: usize = 30;

/// Opaque, immutable identifier of a chat session
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh, unique identifier
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }

    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person asking questions
    User,
    /// The answering service
    Bot,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Bot => f.write_str("bot"),
        }
    }
}

/// One entry of a session's message log
///
/// Messages are built through [`Message::new`], [`Message::user`] or
/// [`Message::bot`], which drop the bot-only fields from user messages and
/// de-duplicate citation labels while keeping their first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Text of the message; bot content may carry lightweight markup
    pub content: String,
    /// Author, fixed at creation
    pub role: Role,
    /// Citation labels, always empty for user messages
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    /// Answer latency reported by the service, bot messages only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_ms: Option<u64>,
    /// When the message was appended
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a message stamped with the current time
    pub fn new(
        content: impl Into<String>,
        role: Role,
        sources: Vec<String>,
        runtime_ms: Option<u64>,
    ) -> Self {
        let (sources, runtime_ms) = match role {
            Role::User => (Vec::new(), None),
            Role::Bot => (dedup_sources(sources), runtime_ms),
        };

        Self {
            content: content.into(),
            role,
            sources,
            runtime_ms,
            timestamp: Utc::now(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(content, Role::User, Vec::new(), None)
    }

    /// Create a bot message with its citations and latency
    pub fn bot(content: impl Into<String>, sources: Vec<String>, runtime_ms: Option<u64>) -> Self {
        Self::new(content, Role::Bot, sources, runtime_ms)
    }
}

fn dedup_sources(sources: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(sources.len());
    for source in sources {
        if !unique.contains(&source) {
            unique.push(source);
        }
    }
    unique
}

/// A persisted conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    /// Identifier assigned when the session started
    pub id: SessionId,
    /// Summary derived from the first message
    pub title: String,
    /// Message log in chronological order
    pub messages: Vec<Message>,
    /// When the session started
    pub created_at: DateTime<Utc>,
    /// When the session was last persisted
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// Start an empty session with a fresh identifier
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::generate(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the session has no messages (and must not be persisted)
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Display projection of the session
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            message_count: self.messages.len(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Lightweight view of a stored session for history listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session identifier
    pub id: SessionId,
    /// Session title
    pub title: String,
    /// Number of messages in the session
    pub message_count: usize,
    /// When the session started
    pub created_at: DateTime<Utc>,
    /// When the session was last persisted
    pub updated_at: DateTime<Utc>,
}

/// Derive a session title from its first message
///
/// The content is trimmed; anything longer than `max_chars` characters keeps
/// its first `max_chars - 3` characters followed by [`ELLIPSIS`]. A missing or
/// blank first message yields [`DEFAULT_TITLE`]. Lengths count characters,
/// not bytes.
///
/// # Examples
///
/// ```
/// use ragdesk::session::derive_title;
///
/// assert_eq!(derive_title(Some("  Hello  "), 30), "Hello");
/// assert_eq!(derive_title(None, 30), "New Chat");
///
/// let long = "a".repeat(40);
/// let title = derive_title(Some(&long), 30);
/// assert_eq!(title.chars().count(), 30);
/// assert!(title.ends_with("..."));
/// ```
pub fn derive_title(first_message: Option<&str>, max_chars: usize) -> String {
    let trimmed = match first_message.map(str::trim) {
        Some(text) if !text.is_empty() => text,
        _ => return DEFAULT_TITLE.to_string(),
    };

    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }

    let keep = max_chars.saturating_sub(ELLIPSIS.chars().count());
    let mut title: String = trimmed.chars().take(keep).collect();
    title.push_str(ELLIPSIS);
    title
}
