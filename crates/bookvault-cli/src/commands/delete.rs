use bookvault_core::config::Settings;

use crate::commands::common::{find_booking, open_service};
use crate::error::CliError;

pub async fn run_delete(id: &str, settings: &Settings) -> Result<(), CliError> {
    let service = open_service(settings)?;
    let booking = find_booking(&service, id).await?;

    service.delete(booking.id).await?;
    println!("{}", booking.id);
    Ok(())
}
