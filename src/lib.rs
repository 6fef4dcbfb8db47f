//! ragdesk - client core for a document question-answering service
//!
//! This library provides the state a chat front-end keeps on the client
//! side: a persisted, capped history of chat sessions and a sequential
//! upload queue that tracks each document through remote processing.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `session`: chat sessions, the capped [`SessionStore`] and recency grouping
//! - `jobs`: upload admission, the [`JobTracker`] and progress parsing
//! - `chat`: the question submission flow built on the session store
//! - `api`: remote service contracts and their `reqwest` clients
//! - `storage`: the key-value persistence interface and its backends
//! - `preferences`: persisted UI flags
//! - `config`: configuration management and validation
//! - `error`: error types and result aliases
//! - `cli`: command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ragdesk::api::HttpQueryClient;
//! use ragdesk::{ChatClient, Config, SessionStore, SqliteStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let store = SessionStore::from_config(Arc::new(SqliteStore::new()?), &config.history);
//!     let api = Arc::new(HttpQueryClient::from_config(&config.services)?);
//!     let mut chat = ChatClient::from_config(store, api, &config.history);
//!     let answer = chat.ask("What does the report conclude?").await?;
//!     println!("{}", answer.content);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod jobs;
pub mod preferences;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use chat::ChatClient;
pub use config::Config;
pub use error::{RagdeskError, Result};
pub use jobs::{JobTracker, UploadFile};
pub use preferences::Preferences;
pub use session::SessionStore;
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
