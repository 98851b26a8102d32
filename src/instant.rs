//! Parsing of raw timestamps into [`Instant`]s.
//!
//! Feeds hand us ISO-8601 strings of varying strictness. Everything with an
//! explicit offset is honoured; naive timestamps are read as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::TimingError;

/// A point in time. All engine arithmetic is done in UTC.
pub type Instant = DateTime<Utc>;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a raw timestamp string.
///
/// Accepts RFC 3339, naive `YYYY-MM-DD[T ]HH:MM[:SS[.fff]]` (UTC) and bare
/// `YYYY-MM-DD` (midnight UTC).
pub fn parse_instant(raw: &str) -> Result<Instant, TimingError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(TimingError::invalid("empty timestamp"));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }

    Err(TimingError::invalid(format!("unparseable timestamp `{raw}`")))
}

/// Parse an optional raw timestamp, treating `None` and blank strings as absent.
pub fn parse_optional_instant(raw: Option<&str>) -> Result<Option<Instant>, TimingError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_instant(s).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_rfc3339_with_offset() {
        let got = parse_instant("2024-01-01T09:00:00-03:00").unwrap();
        assert_eq!(got, Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn parses_naive_forms_as_utc() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap();
        assert_eq!(parse_instant("2024-01-01T09:30:00").unwrap(), expected);
        assert_eq!(parse_instant("2024-01-01 09:30:00").unwrap(), expected);
        assert_eq!(parse_instant("2024-01-01 09:30").unwrap(), expected);
        assert_eq!(
            parse_instant("2024-01-01T09:30:00.250").unwrap(),
            expected + chrono::TimeDelta::milliseconds(250)
        );
    }

    #[test]
    fn parses_date_only_as_midnight() {
        assert_eq!(
            parse_instant("2024-03-15").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse_instant("yesterday-ish"),
            Err(TimingError::InvalidInput(_))
        ));
        assert!(matches!(parse_instant("   "), Err(TimingError::InvalidInput(_))));
        assert!(parse_instant("2024-02-30").is_err());
    }

    #[test]
    fn optional_blank_is_absent() {
        assert_eq!(parse_optional_instant(None).unwrap(), None);
        assert_eq!(parse_optional_instant(Some(" ")).unwrap(), None);
        assert!(parse_optional_instant(Some("2024-01-01")).unwrap().is_some());
    }
}
