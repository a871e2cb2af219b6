//! Shared services used by front ends

mod bookings;

pub use bookings::BookingService;
