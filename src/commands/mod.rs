/*!
Command handlers for the CLI

This module provides the handlers invoked by the CLI entrypoint:

- `chat`     interactive chat and one-shot questions
- `history`  listing and managing stored sessions
- `upload`   document upload with live progress
- `prefs`    UI preference flags

Handlers are thin: they wire configuration into the library components
and print results.
*/

use crate::config::Config;
use crate::error::Result;
use crate::session::{ChatSession, Message, Role};
use crate::storage::{KeyValueStore, SqliteStore};
use colored::Colorize;
use std::sync::Arc;

pub mod chat;
pub mod history;
pub mod prefs;
pub mod special_commands;
pub mod upload;

/// Open the durable store named by the configuration
///
/// Falls back to the platform data directory when no path is configured.
pub fn open_storage(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    let store = match &config.storage.path {
        Some(path) => SqliteStore::new_with_path(path)?,
        None => SqliteStore::new()?,
    };
    tracing::debug!("Using storage at {}", store.path().display());
    Ok(Arc::new(store))
}

/// Print one message the way the chat displays it
pub(crate) fn print_message(message: &Message) {
    match message.role {
        Role::User => println!("{} {}", "You:".bold().green(), message.content),
        Role::Bot => {
            println!("{} {}", "Bot:".bold().blue(), message.content);
            if !message.sources.is_empty() {
                println!(
                    "     {} {}",
                    "Sources:".dimmed(),
                    message.sources.join(", ").dimmed()
                );
            }
            if let Some(runtime_ms) = message.runtime_ms {
                println!("     {}", format!("Response time: {}ms", runtime_ms).dimmed());
            }
        }
    }
}

/// Print a whole session, header first
pub(crate) fn print_session(session: &ChatSession) {
    println!();
    println!("{} {}", session.title.bold(), format!("({})", session.id).cyan());
    println!(
        "{}",
        format!(
            "Started {}, {} message(s)",
            session.created_at.format("%Y-%m-%d %H:%M"),
            session.messages.len()
        )
        .dimmed()
    );
    println!();
    for message in &session.messages {
        print_message(message);
    }
    println!();
}
