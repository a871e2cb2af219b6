//! bookvault-core - Core library for Bookvault
//!
//! This crate holds the booking/consultation records, the `SQLite` record
//! store, the vault mirror (codec, inline writer, viewer signal) and the
//! cursor-based reconciliation job used by the `bookvault` CLI.

pub mod config;
pub mod db;
pub mod error;
pub mod mirror;
pub mod models;
pub mod services;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{Booking, BookingId, BookingStatus};
