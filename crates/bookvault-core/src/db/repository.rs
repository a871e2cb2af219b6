//! Booking repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT/OFFSET

use crate::error::{Error, Result};
use crate::models::{
    Booking, BookingId, BookingStatus, NewBooking, NewConsultation, CONSULTATION_CONTACT_TYPE,
};
use crate::util::unix_millis_now;
use rusqlite::{params, Connection, OptionalExtension};

const BOOKING_COLUMNS: &str = "id, name, contact, contact_type, appointment_time, content, status, source_slug, created_at";

/// Read side the reconciliation job depends on
pub trait BookingFeed {
    /// All bookings with `id > after`, ascending by id
    fn bookings_after(&self, after: BookingId) -> Result<Vec<Booking>>;
}

/// Trait for booking storage operations
pub trait BookingRepository: BookingFeed {
    /// Store a booking with status `pending`
    fn create_booking(&self, booking: &NewBooking) -> Result<Booking>;

    /// Store a consultation (terminal status `consultation`)
    fn create_consultation(&self, consultation: &NewConsultation) -> Result<Booking>;

    /// Get a booking by ID
    fn get(&self, id: BookingId) -> Result<Option<Booking>>;

    /// List bookings, newest first
    fn list(&self, limit: usize, offset: usize) -> Result<Vec<Booking>>;

    /// Move a booking to a new status
    fn update_status(&self, id: BookingId, status: BookingStatus) -> Result<Booking>;

    /// Hard delete a booking
    fn delete(&self, id: BookingId) -> Result<()>;
}

/// Column values for a new row; `id` is assigned by `SQLite`
struct InsertRow<'a> {
    name: &'a str,
    contact: &'a str,
    contact_type: Option<&'a str>,
    appointment_time: i64,
    content: &'a str,
    status: BookingStatus,
    source_slug: Option<&'a str>,
    created_at: i64,
}

/// `SQLite` implementation of `BookingRepository`
pub struct SqliteBookingRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteBookingRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn insert(&self, row: &InsertRow<'_>) -> Result<Booking> {
        self.conn.execute(
            "INSERT INTO bookings (name, contact, contact_type, appointment_time, content, status, source_slug, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                row.name,
                row.contact,
                row.contact_type,
                row.appointment_time,
                row.content,
                row.status.as_str(),
                row.source_slug,
                row.created_at
            ],
        )?;

        let id = BookingId::new(self.conn.last_insert_rowid());
        self.get(id)?
            .ok_or_else(|| Error::Database(format!("Inserted booking {id} could not be read back")))
    }

    /// Parse a booking from a database row
    fn parse_booking(row: &rusqlite::Row<'_>) -> rusqlite::Result<Booking> {
        let status: String = row.get(6)?;
        let status = status.parse::<BookingStatus>().map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(
                6,
                rusqlite::types::Type::Text,
                Box::new(error),
            )
        })?;

        Ok(Booking {
            id: BookingId::new(row.get(0)?),
            name: row.get(1)?,
            contact: row.get(2)?,
            contact_type: row.get(3)?,
            appointment_time: row.get(4)?,
            content: row.get(5)?,
            status,
            source_slug: row.get(7)?,
            created_at: row.get(8)?,
        })
    }
}

impl BookingFeed for SqliteBookingRepository<'_> {
    fn bookings_after(&self, after: BookingId) -> Result<Vec<Booking>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id > ? ORDER BY id ASC"
        ))?;

        let bookings = stmt
            .query_map(params![after.get()], Self::parse_booking)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(bookings)
    }
}

impl BookingRepository for SqliteBookingRepository<'_> {
    fn create_booking(&self, booking: &NewBooking) -> Result<Booking> {
        self.insert(&InsertRow {
            name: &booking.name,
            contact: &booking.contact,
            contact_type: booking.contact_type.as_deref(),
            appointment_time: booking.appointment_time,
            content: &booking.content,
            status: BookingStatus::Pending,
            source_slug: booking.source_slug.as_deref(),
            created_at: unix_millis_now(),
        })
    }

    fn create_consultation(&self, consultation: &NewConsultation) -> Result<Booking> {
        let now = unix_millis_now();
        self.insert(&InsertRow {
            name: consultation.display_name(),
            contact: consultation.contact.as_deref().unwrap_or(""),
            contact_type: Some(CONSULTATION_CONTACT_TYPE),
            appointment_time: now,
            content: &consultation.message,
            status: BookingStatus::Consultation,
            source_slug: consultation.source_slug.as_deref(),
            created_at: now,
        })
    }

    fn get(&self, id: BookingId) -> Result<Option<Booking>> {
        let booking = self
            .conn
            .query_row(
                &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?"),
                params![id.get()],
                Self::parse_booking,
            )
            .optional()?;

        Ok(booking)
    }

    fn list(&self, limit: usize, offset: usize) -> Result<Vec<Booking>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BOOKING_COLUMNS}
             FROM bookings
             ORDER BY created_at DESC, id DESC
             LIMIT ? OFFSET ?"
        ))?;

        let bookings = stmt
            .query_map(params![limit as i64, offset as i64], Self::parse_booking)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(bookings)
    }

    fn update_status(&self, id: BookingId, status: BookingStatus) -> Result<Booking> {
        let rows = self.conn.execute(
            "UPDATE bookings SET status = ? WHERE id = ?",
            params![status.as_str(), id.get()],
        )?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }

        self.get(id)?.ok_or_else(|| Error::NotFound(id.to_string()))
    }

    fn delete(&self, id: BookingId) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM bookings WHERE id = ?", params![id.get()])?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }

        Ok(())
    }
}
