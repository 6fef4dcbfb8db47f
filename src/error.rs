//! Error types for ragdesk
//!
//! This module defines the error taxonomy shared by the session store, the
//! upload job tracker and the HTTP clients, using `thiserror` for ergonomic
//! error handling.

use thiserror::Error;

/// Main error type for ragdesk operations
///
/// The variants follow the propagation policy of the client core:
/// validation and transport errors are surfaced to the user, parse and
/// persistence errors are usually absorbed locally with safe defaults.
#[derive(Error, Debug)]
pub enum RagdeskError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Inadmissible input (wrong file type, file too large, empty question)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Network failure or non-success HTTP status from a remote service
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed or unexpected payload from a remote service
    #[error("Parse error: {0}")]
    Parse(String),

    /// Durable storage read/write failure (quota, corruption, database)
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A referenced session or job does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// SQLite errors from the durable key-value backend
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type alias for ragdesk operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
