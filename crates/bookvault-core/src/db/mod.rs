//! Record store for Bookvault

mod connection;
mod migrations;
mod repository;

pub use connection::{database_path_from_url, Database};
pub use repository::{BookingFeed, BookingRepository, SqliteBookingRepository};
