//! Booking model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::util::normalize_text_option;

/// Display name stored for consultations submitted without a contact
pub const ANONYMOUS_NAME: &str = "Anonymous";

/// Contact channel recorded for consultations (they arrive via the email form)
pub const CONSULTATION_CONTACT_TYPE: &str = "email-form";

/// Store-assigned identifier, strictly increasing in creation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BookingId(i64);

impl BookingId {
    /// The "start of history" value; no stored booking has an id this low
    pub const ORIGIN: Self = Self(0);

    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BookingId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value: i64 = trimmed
            .parse()
            .map_err(|_| Error::InvalidInput(format!("Invalid booking id: {trimmed}")))?;
        if value <= 0 {
            return Err(Error::InvalidInput(format!(
                "Booking id must be positive: {value}"
            )));
        }
        Ok(Self(value))
    }
}

/// Lifecycle state of a record
///
/// `Consultation` is terminal on creation and never transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    Consultation,
}

impl BookingStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Consultation => "consultation",
        }
    }

    #[must_use]
    pub const fn is_consultation(self) -> bool {
        matches!(self, Self::Consultation)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            "consultation" => Ok(Self::Consultation),
            other => Err(Error::InvalidInput(format!("Unknown booking status: {other}"))),
        }
    }
}

/// A booking or consultation record as held by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Unique identifier, the sole progress key for mirroring
    pub id: BookingId,
    /// Display name (`Anonymous` for consultations without contact)
    pub name: String,
    /// Free-text contact channel; may be empty for consultations
    pub contact: String,
    /// Kind of contact channel
    pub contact_type: Option<String>,
    /// Appointment timestamp (Unix ms); submission time for consultations
    pub appointment_time: i64,
    /// Request details or consultation message
    pub content: String,
    /// Lifecycle status
    pub status: BookingStatus,
    /// Public page that produced the record
    pub source_slug: Option<String>,
    /// Creation timestamp (Unix ms), immutable
    pub created_at: i64,
}

impl Booking {
    #[must_use]
    pub const fn is_consultation(&self) -> bool {
        self.status.is_consultation()
    }
}

/// Input for a booking submitted from a landing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    pub name: String,
    pub contact: String,
    #[serde(default)]
    pub contact_type: Option<String>,
    /// Appointment timestamp (Unix ms)
    pub appointment_time: i64,
    pub content: String,
    #[serde(default)]
    pub source_slug: Option<String>,
}

impl NewBooking {
    /// Trim fields and reject submissions missing required values.
    pub fn validate(self) -> crate::Result<Self> {
        Ok(Self {
            name: required(self.name, "name")?,
            contact: required(self.contact, "contact")?,
            contact_type: normalize_text_option(self.contact_type),
            appointment_time: self.appointment_time,
            content: required(self.content, "content")?,
            source_slug: normalize_text_option(self.source_slug),
        })
    }
}

/// Input for a consultation message (email fallback form)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewConsultation {
    pub message: String,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub source_slug: Option<String>,
}

impl NewConsultation {
    pub fn validate(self) -> crate::Result<Self> {
        Ok(Self {
            message: required(self.message, "message")?,
            contact: normalize_text_option(self.contact),
            source_slug: normalize_text_option(self.source_slug),
        })
    }

    /// Name stored for the consultation: the contact, or `Anonymous`.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.contact.as_deref().unwrap_or(ANONYMOUS_NAME)
    }
}

fn required(value: String, field: &str) -> crate::Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}
