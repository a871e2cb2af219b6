//! Record → vault file rendering.
//!
//! Both the inline writer and the reconciliation job name files through
//! [`mirror_file_name`], so "a file with this name exists" is a complete
//! answer to "has this record been mirrored".

use std::fmt::Write as _;
use std::sync::LazyLock;

use chrono::DateTime;
use chrono_tz::Tz;
use regex::Regex;

use crate::models::{Booking, BookingStatus};

/// Directory under the vault root that holds every mirror file
pub const RECORD_DIR_NAME: &str = "记录";

/// File name prefix for bookings
pub const BOOKING_PREFIX: &str = "预约";

/// File name prefix for consultations
pub const CONSULTATION_PREFIX: &str = "咨询";

/// Extension of mirror files
pub const MIRROR_EXTENSION: &str = "md";

/// Zone every mirror timestamp is rendered in, regardless of server locale
pub const MIRROR_TIME_ZONE: Tz = chrono_tz::Asia::Manila;

/// Marker for absent optional fields
pub const NOT_PROVIDED: &str = "N/A";

/// Marker for a consultation submitted without contact details
pub const CONTACT_NOT_PROVIDED: &str = "未提供";

/// Byte budget for the name segment of a booking file name.
///
/// Keeps prefix, name and `-<id>.md` well under the common 255-byte
/// file name limit.
pub const MAX_NAME_BYTES: usize = 120;

static PATH_HOSTILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[/\\:*?"<>|\x00-\x1F]"#).expect("Invalid regex"));

/// A rendered mirror file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorFile {
    pub file_name: String,
    pub content: String,
}

impl MirrorFile {
    /// Render the mirror file for a booking.
    #[must_use]
    pub fn from_booking(booking: &Booking) -> Self {
        Self {
            file_name: mirror_file_name(booking),
            content: render_mirror_content(booking),
        }
    }

    /// File name without the extension, as vault links address notes
    #[must_use]
    pub fn stem(&self) -> &str {
        self.file_name
            .strip_suffix(MIRROR_EXTENSION)
            .and_then(|stem| stem.strip_suffix('.'))
            .unwrap_or(&self.file_name)
    }
}

/// Deterministic file name for a booking.
///
/// Consultations are keyed by id alone since they may be anonymous.
#[must_use]
pub fn mirror_file_name(booking: &Booking) -> String {
    if booking.is_consultation() {
        format!("{CONSULTATION_PREFIX}-{}.{MIRROR_EXTENSION}", booking.id)
    } else {
        format!(
            "{BOOKING_PREFIX}-{}-{}.{MIRROR_EXTENSION}",
            sanitize_name(&booking.name),
            booking.id
        )
    }
}

/// Replace characters that would break out of, or be rejected by, the
/// mirror directory, then cut the result to [`MAX_NAME_BYTES`] on a char
/// boundary.
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    let sanitized = PATH_HOSTILE.replace_all(name, "_");
    truncate_to_char_boundary(&sanitized, MAX_NAME_BYTES).to_string()
}

fn truncate_to_char_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }

    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Render a Unix-ms timestamp in the mirror time zone.
///
/// Out-of-range values fall back to the raw number so rendering stays total.
#[must_use]
pub fn format_mirror_time(timestamp_ms: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |utc| {
            utc.with_timezone(&MIRROR_TIME_ZONE)
                .format("%Y/%-m/%-d %H:%M:%S")
                .to_string()
        },
    )
}

/// Render the markdown document for a booking.
#[must_use]
pub fn render_mirror_content(booking: &Booking) -> String {
    if booking.is_consultation() {
        render_consultation(booking)
    } else {
        render_booking(booking)
    }
}

fn render_booking(booking: &Booking) -> String {
    let created = format_mirror_time(booking.created_at);
    let mut output = String::new();

    write_frontmatter(&mut output, "booking", &created, booking.status);
    let _ = writeln!(output, "# {BOOKING_PREFIX} - {}", booking.name);
    let _ = writeln!(output);
    let _ = writeln!(output, "- **称呼**: {}", booking.name);
    let _ = writeln!(
        output,
        "- **联系方式**: {} ({})",
        booking.contact,
        or_not_provided(booking.contact_type.as_deref(), NOT_PROVIDED)
    );
    let _ = writeln!(
        output,
        "- **预约时间**: {}",
        format_mirror_time(booking.appointment_time)
    );
    let _ = writeln!(
        output,
        "- **来源页面**: {}",
        or_not_provided(booking.source_slug.as_deref(), NOT_PROVIDED)
    );
    let _ = writeln!(output, "- **状态**: {}", booking.status);
    let _ = writeln!(output);
    let _ = writeln!(output, "## 预约内容");
    write_body_and_footer(&mut output, &booking.content, &created);

    output
}

fn render_consultation(booking: &Booking) -> String {
    let created = format_mirror_time(booking.created_at);
    let mut output = String::new();

    write_frontmatter(&mut output, "consultation", &created, booking.status);
    let _ = writeln!(output, "# {CONSULTATION_PREFIX} - {}", booking.name);
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "- **联系方式**: {}",
        or_not_provided(Some(booking.contact.as_str()), CONTACT_NOT_PROVIDED)
    );
    let _ = writeln!(
        output,
        "- **来源页面**: {}",
        or_not_provided(booking.source_slug.as_deref(), NOT_PROVIDED)
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## 咨询内容");
    write_body_and_footer(&mut output, &booking.content, &created);

    output
}

fn write_frontmatter(output: &mut String, kind: &str, created: &str, status: BookingStatus) {
    let _ = writeln!(output, "---");
    let _ = writeln!(output, "tags: [{kind}, landing-page]");
    let _ = writeln!(output, "created: {created}");
    let _ = writeln!(output, "status: {status}");
    let _ = writeln!(output, "---");
    let _ = writeln!(output);
}

fn write_body_and_footer(output: &mut String, body: &str, created: &str) {
    let _ = writeln!(output);
    let _ = writeln!(output, "{body}");
    let _ = writeln!(output);
    let _ = writeln!(output, "---");
    let _ = writeln!(output, "*自动记录于 {created}*");
}

fn or_not_provided<'a>(value: Option<&'a str>, marker: &'a str) -> &'a str {
    match value {
        Some(value) if !value.trim().is_empty() => value,
        _ => marker,
    }
}
