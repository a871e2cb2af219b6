use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] bookvault_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No content provided")]
    EmptyContent,
    #[error("Invalid appointment time `{0}` (expected RFC 3339 or `YYYY-MM-DD HH:MM`)")]
    InvalidTime(String),
    #[error("Booking not found: {0}")]
    BookingNotFound(String),
    #[error("Configuration error: {0}")]
    Config(String),
}
