//! Data models for Bookvault

mod booking;

pub use booking::{
    Booking, BookingId, BookingStatus, NewBooking, NewConsultation, ANONYMOUS_NAME,
    CONSULTATION_CONTACT_TYPE,
};
