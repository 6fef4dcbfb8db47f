//! Chat session history
//!
//! - `types`: sessions, messages and title derivation
//! - `store`: the persisted, capped [`SessionStore`]
//! - `grouping`: Today / Yesterday / Older display buckets

pub mod grouping;
pub mod store;
pub mod types;

pub use grouping::{group_by_recency, Dated, RecencyGroups};
pub use store::{SessionEvent, SessionStore, DEFAULT_MAX_SESSIONS};
pub use types::{
    derive_title, ChatSession, Message, Role, SessionId, SessionSummary, DEFAULT_TITLE,
    DEFAULT_TITLE_MAX_CHARS, ELLIPSIS,
};
