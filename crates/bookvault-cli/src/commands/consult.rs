use bookvault_core::config::Settings;
use bookvault_core::models::NewConsultation;

use crate::commands::common::{open_service, resolve_content, MIRROR_SETTLE_LIMIT};
use crate::error::CliError;

pub async fn run_consult(
    contact: Option<&str>,
    source: Option<&str>,
    message_parts: &[String],
    settings: &Settings,
) -> Result<(), CliError> {
    let message = resolve_content(message_parts)?;

    let service = open_service(settings)?;
    let consultation = service
        .create_consultation(NewConsultation {
            message,
            contact: contact.map(str::to_string),
            source_slug: source.map(str::to_string),
        })
        .await?;

    println!("{}", consultation.id);
    service.settle_mirror_writes(MIRROR_SETTLE_LIMIT).await;
    Ok(())
}
