//! Error types for bookvault-core

use thiserror::Error;

/// Result type alias using bookvault-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in bookvault-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// `SQLite` error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Booking not found
    #[error("Booking not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Persisted sync state could not be trusted
    #[error("Corrupt sync state at {path}: {reason}")]
    CorruptState { path: String, reason: String },
}
