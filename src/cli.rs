//! Command-line interface definition for ragdesk
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for asking questions, browsing chat history and
//! uploading documents.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ragdesk - terminal client for a document question-answering service
///
/// Ask questions against indexed documents, keep a short local history of
/// conversations and upload new PDFs for indexing.
#[derive(Parser, Debug, Clone)]
#[command(name = "ragdesk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the SQLite file holding history and preferences
    #[arg(long, env = "RAGDESK_STORAGE_PATH")]
    pub storage_path: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for ragdesk
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Ask a single question and print the answer
    Ask {
        /// The question to ask
        question: String,

        /// Continue a stored session instead of starting a new one
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Start an interactive chat
    Chat {
        /// Resume a stored session by ID
        #[arg(short, long)]
        resume: Option<String>,
    },

    /// Browse and manage stored chat sessions
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },

    /// Upload documents for indexing
    Upload {
        /// Files to upload, processed one after another
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Show or change UI preferences
    Prefs {
        #[command(subcommand)]
        command: PrefsCommand,
    },
}

/// History management subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum HistoryCommand {
    /// List stored sessions grouped by day
    List,

    /// Print the messages of a stored session
    Show {
        /// Session ID
        id: String,
    },

    /// Delete a stored session
    Delete {
        /// Session ID
        id: String,
    },

    /// Delete every stored session
    Clear,
}

/// Preference subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum PrefsCommand {
    /// Print the current preferences
    Show,

    /// Collapse or expand the history sidebar
    ToggleSidebar,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            storage_path: None,
            command: Commands::History {
                command: HistoryCommand::List,
            },
        }
    }
}
