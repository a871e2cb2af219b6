use bookvault_core::config::Settings;
use bookvault_core::BookingStatus;

use crate::commands::common::{open_service, parse_booking_id};
use crate::error::CliError;

pub async fn run_status(id: &str, status: &str, settings: &Settings) -> Result<(), CliError> {
    let booking_id = parse_booking_id(id)?;
    let status = status.parse::<BookingStatus>()?;

    let service = open_service(settings)?;
    let booking = service.update_status(booking_id, status).await?;

    println!("{} {}", booking.id, booking.status);
    Ok(())
}
