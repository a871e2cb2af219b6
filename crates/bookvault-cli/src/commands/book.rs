use bookvault_core::config::Settings;
use bookvault_core::models::NewBooking;

use crate::commands::common::{
    open_service, parse_appointment_time, resolve_content, MIRROR_SETTLE_LIMIT,
};
use crate::error::CliError;

pub struct BookArgs<'a> {
    pub name: &'a str,
    pub contact: &'a str,
    pub contact_type: Option<&'a str>,
    pub at: &'a str,
    pub source: Option<&'a str>,
    pub content: &'a [String],
}

pub async fn run_book(args: BookArgs<'_>, settings: &Settings) -> Result<(), CliError> {
    let appointment_time = parse_appointment_time(args.at)?;
    let content = resolve_content(args.content)?;

    let service = open_service(settings)?;
    let booking = service
        .create_booking(NewBooking {
            name: args.name.to_string(),
            contact: args.contact.to_string(),
            contact_type: args.contact_type.map(str::to_string),
            appointment_time,
            content,
            source_slug: args.source.map(str::to_string),
        })
        .await?;

    println!("{}", booking.id);
    service.settle_mirror_writes(MIRROR_SETTLE_LIMIT).await;
    Ok(())
}
