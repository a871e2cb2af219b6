use std::io::{self, IsTerminal, Read};
use std::time::Duration;

use bookvault_core::config::Settings;
use bookvault_core::mirror::{format_mirror_time, mirror_file_name, MIRROR_TIME_ZONE};
use bookvault_core::services::BookingService;
use bookvault_core::{Booking, BookingId};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;

use crate::error::CliError;

/// How long a capture command waits for its inline mirror write before exit
pub const MIRROR_SETTLE_LIMIT: Duration = Duration::from_secs(5);

const LOCAL_TIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

#[derive(Debug, Serialize)]
pub struct BookingListItem {
    pub id: i64,
    pub status: String,
    pub name: String,
    pub contact: String,
    pub contact_type: Option<String>,
    pub appointment_time: i64,
    pub appointment_time_local: String,
    pub source_slug: Option<String>,
    pub content: String,
    pub created_at: i64,
    pub relative_time: String,
    pub mirror_file: String,
}

pub fn open_service(settings: &Settings) -> Result<BookingService, CliError> {
    Ok(BookingService::open_path(
        &settings.db_path,
        settings.inline_writer(),
    )?)
}

/// Open a store that must already exist, for commands that only read
/// what capture has written.
pub fn open_existing_service(settings: &Settings) -> Result<BookingService, CliError> {
    Ok(BookingService::open_existing(
        &settings.db_path,
        settings.inline_writer(),
    )?)
}

pub fn parse_booking_id(id: &str) -> Result<BookingId, CliError> {
    Ok(id.parse::<BookingId>()?)
}

pub async fn find_booking(service: &BookingService, id: &str) -> Result<Booking, CliError> {
    let booking_id = parse_booking_id(id)?;
    service
        .get(booking_id)
        .await?
        .ok_or_else(|| CliError::BookingNotFound(booking_id.to_string()))
}

/// Parse an appointment time given as RFC 3339 or as a wall-clock time in
/// the vault's time zone.
pub fn parse_appointment_time(raw: &str) -> Result<i64, CliError> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.timestamp_millis());
    }

    LOCAL_TIME_FORMATS
        .iter()
        .filter_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .find_map(|naive| MIRROR_TIME_ZONE.from_local_datetime(&naive).earliest())
        .map(|local| local.timestamp_millis())
        .ok_or_else(|| CliError::InvalidTime(trimmed.to_string()))
}

pub fn resolve_content(content_parts: &[String]) -> Result<String, CliError> {
    if let Some(content) = normalize_content(&content_parts.join(" ")) {
        return Ok(content);
    }

    if let Some(content) = read_piped_stdin()? {
        return Ok(content);
    }

    Err(CliError::EmptyContent)
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

pub fn format_booking_lines(bookings: &[Booking]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    bookings
        .iter()
        .map(|booking| {
            let preview = content_preview(&booking.content, 40);
            let relative_time = format_relative_time(booking.created_at, now_ms);
            let name = content_preview(&booking.name, 20);
            format!(
                "{:>6}  {:<12}  {name:<20}  {preview:<40}  {relative_time}",
                booking.id,
                booking.status.as_str()
            )
        })
        .collect()
}

pub fn format_booking_detail(booking: &Booking) -> Vec<String> {
    let mut lines = vec![
        format!("id:           {}", booking.id),
        format!("status:       {}", booking.status),
        format!("name:         {}", booking.name),
        format!(
            "contact:      {} ({})",
            booking.contact,
            booking.contact_type.as_deref().unwrap_or("-")
        ),
    ];
    if !booking.is_consultation() {
        lines.push(format!(
            "appointment:  {}",
            format_mirror_time(booking.appointment_time)
        ));
    }
    lines.push(format!(
        "source:       {}",
        booking.source_slug.as_deref().unwrap_or("-")
    ));
    lines.push(format!(
        "created:      {}",
        format_mirror_time(booking.created_at)
    ));
    lines.push(format!("mirror file:  {}", mirror_file_name(booking)));
    lines.push(String::new());
    lines.push(booking.content.clone());
    lines
}

pub fn booking_to_list_item(booking: &Booking) -> BookingListItem {
    let now_ms = Utc::now().timestamp_millis();
    BookingListItem {
        id: booking.id.get(),
        status: booking.status.as_str().to_string(),
        name: booking.name.clone(),
        contact: booking.contact.clone(),
        contact_type: booking.contact_type.clone(),
        appointment_time: booking.appointment_time,
        appointment_time_local: format_mirror_time(booking.appointment_time),
        source_slug: booking.source_slug.clone(),
        content: booking.content.clone(),
        created_at: booking.created_at,
        relative_time: format_relative_time(booking.created_at, now_ms),
        mirror_file: mirror_file_name(booking),
    }
}

pub fn content_preview(content: &str, max_chars: usize) -> String {
    let first_line = content.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else {
        format!("{}w ago", diff / week)
    }
}
