//! Date header parsing and formatting.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};

use crate::error::{Error, Result};

/// Format of the `Date` header (RFC 5322 section 3.3).
const RFC5322_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// Formats a timestamp for the `Date` header.
#[must_use]
pub fn format_date<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format(RFC5322_FORMAT).to_string()
}

/// Parses a user supplied date.
///
/// Accepted forms:
/// - RFC 2822: `Tue, 1 Jul 2003 10:52:37 +0200`
/// - RFC 3339: `2003-07-01T10:52:37+02:00`
/// - `YYYY-MM-DD HH:MM:SS ZONE`, where ZONE is a numeric offset (`-0700`)
///   or one of UTC, GMT, EST, EDT, CST, CDT, MST, MDT, PST, PDT
///
/// # Errors
///
/// Returns [`Error::InvalidDate`] if no form matches.
pub fn parse_date(input: &str) -> Result<DateTime<FixedOffset>> {
    let input = input.trim();

    if let Ok(date) = DateTime::parse_from_rfc2822(input) {
        return Ok(date);
    }
    if let Ok(date) = DateTime::parse_from_rfc3339(input) {
        return Ok(date);
    }
    if let Ok(date) = DateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S %z") {
        return Ok(date);
    }

    let invalid = || Error::InvalidDate(input.to_string());
    let (local, zone) = input.rsplit_once(' ').ok_or_else(invalid)?;
    let offset = zone_offset(zone).ok_or_else(invalid)?;
    let naive = NaiveDateTime::parse_from_str(local, "%Y-%m-%d %H:%M:%S").map_err(|_| invalid())?;

    offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(invalid)
}

/// Offsets of the zone abbreviations RFC 5322 section 4.3 still allows.
fn zone_offset(zone: &str) -> Option<FixedOffset> {
    let hours = match zone.to_ascii_uppercase().as_str() {
        "UTC" | "GMT" | "UT" | "Z" => 0,
        "EDT" => -4,
        "EST" | "CDT" => -5,
        "CST" | "MDT" => -6,
        "MST" | "PDT" => -7,
        "PST" => -8,
        _ => return None,
    };
    FixedOffset::east_opt(hours * 3600)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rfc2822() {
        let date = parse_date("Tue, 1 Jul 2003 10:52:37 +0200").unwrap();
        assert_eq!(format_date(&date), "Tue, 01 Jul 2003 10:52:37 +0200");
    }

    #[test]
    fn test_parse_rfc3339() {
        let date = parse_date("2003-07-01T10:52:37+02:00").unwrap();
        assert_eq!(format_date(&date), "Tue, 01 Jul 2003 10:52:37 +0200");
    }

    #[test]
    fn test_parse_numeric_offset() {
        let date = parse_date("2023-01-01 12:00:00 -0700").unwrap();
        assert_eq!(format_date(&date), "Sun, 01 Jan 2023 12:00:00 -0700");
    }

    #[test]
    fn test_parse_zone_abbreviation() {
        let date = parse_date("2023-01-01 12:00:00 PST").unwrap();
        assert_eq!(format_date(&date), "Sun, 01 Jan 2023 12:00:00 -0800");

        let date = parse_date("2023-01-01 12:00:00 UTC").unwrap();
        assert_eq!(format_date(&date), "Sun, 01 Jan 2023 12:00:00 +0000");
    }

    #[test]
    fn test_parse_invalid() {
        for input in ["", "yesterday", "2023-13-01 12:00:00 UTC", "2023-01-01 12:00:00 XYZ"] {
            assert!(
                matches!(parse_date(input), Err(Error::InvalidDate(_))),
                "{input:?}"
            );
        }
    }
}
