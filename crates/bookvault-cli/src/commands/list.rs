use bookvault_core::config::Settings;

use crate::commands::common::{
    booking_to_list_item, find_booking, format_booking_detail, format_booking_lines, open_service,
    BookingListItem,
};
use crate::error::CliError;

pub async fn run_list(limit: usize, as_json: bool, settings: &Settings) -> Result<(), CliError> {
    let service = open_service(settings)?;
    let bookings = service.list(limit, 0).await?;

    if as_json {
        let json_items = bookings
            .iter()
            .map(booking_to_list_item)
            .collect::<Vec<BookingListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_booking_lines(&bookings) {
            println!("{line}");
        }
    }

    Ok(())
}

pub async fn run_show(id: &str, as_json: bool, settings: &Settings) -> Result<(), CliError> {
    let service = open_service(settings)?;
    let booking = find_booking(&service, id).await?;

    if as_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&booking_to_list_item(&booking))?
        );
    } else {
        for line in format_booking_detail(&booking) {
            println!("{line}");
        }
    }

    Ok(())
}
