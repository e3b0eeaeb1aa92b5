//! # Temporal Module
//!
//! Timestamp parsing for recency comparisons.
//!
//! Timestamps stay verbatim inside aggregates; this module only turns them into
//! comparable UTC instants. All parsed times are normalized to UTC. Anything that
//! does not match a known form is reported as unparsable (`None`) rather than
//! raising an error.

use time::format_description::well_known::Rfc3339;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

/// Epoch strings with at least this many digits are read as milliseconds.
const EPOCH_MILLIS_MIN_DIGITS: usize = 13;

/// Parse a raw timestamp into a UTC instant.
///
/// Accepted forms, tried in order:
/// * RFC 3339 (`2024-01-02T09:00:00Z`, `2024-01-02T09:00:00.123+05:30`)
/// * naive date-time with `T` or space separator, read as UTC
/// * bare calendar date, read as midnight UTC
/// * all-digit Unix epoch, milliseconds when 13+ digits and seconds otherwise
pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(parsed.to_offset(time::UtcOffset::UTC));
    }

    if raw.bytes().all(|b| b.is_ascii_digit()) {
        return parse_epoch(raw);
    }

    parse_naive(raw)
}

fn parse_naive(raw: &str) -> Option<OffsetDateTime> {
    let naive_formats: [&[BorrowedFormatItem<'static>]; 4] = [
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ];

    if let Some(naive) = naive_formats
        .iter()
        .find_map(|format| PrimitiveDateTime::parse(raw, format).ok())
    {
        return Some(naive.assume_utc());
    }

    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|date| date.midnight().assume_utc())
}

fn parse_epoch(digits: &str) -> Option<OffsetDateTime> {
    let value: i64 = digits.parse().ok()?;
    if digits.len() >= EPOCH_MILLIS_MIN_DIGITS {
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(value) * 1_000_000).ok()
    } else {
        OffsetDateTime::from_unix_timestamp(value).ok()
    }
}

/// Returns true when `candidate` should replace `current` as the latest time.
///
/// An unparsable candidate never replaces anything, and a parsable candidate
/// always replaces an unparsable current. Equal instants favour the candidate
/// so that the later row in collection order wins a tie.
pub fn is_at_or_after(candidate: &str, current: &str) -> bool {
    match (parse_timestamp(candidate), parse_timestamp(current)) {
        (Some(candidate), Some(current)) => candidate >= current,
        (Some(_), None) => true,
        (None, _) => false,
    }
}
