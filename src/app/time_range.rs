//! Time Window Resolution
//!
//! Converts the date expressions accepted on the command line into epoch
//! millisecond bounds. Two grammars:
//!
//! - Relative: `<n><unit>` with an optional trailing ` ago`, unit one of
//!   `m|minute|minutes`, `h|hour|hours`, `d|day|days`, `w|week|weeks`
//! - Absolute: RFC 3339, `%Y-%m-%d[ %H:%M[:%S]]` (`T` separator also
//!   accepted) or `%d/%m/%Y`; offsets are converted to UTC, naive
//!   timestamps are taken as UTC
//!
//! Absent or empty input leaves that side of the window unbounded.

#![warn(clippy::all, rust_2018_idioms)]

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::app::errors::Error;

static RELATIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)\s?(m|minute|minutes|h|hour|hours|d|day|days|w|week|weeks)(?: ago)?$")
        .expect("relative date regex is valid")
});

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Resolves a date expression against `now`. Pure: `now` is always supplied
/// by the caller, never sampled here.
pub fn resolve(text: Option<&str>, now: DateTime<Utc>) -> Result<Option<i64>, Error> {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };

    if let Some(captures) = RELATIVE_RE.captures(text) {
        let amount: i64 = captures[1]
            .parse()
            .map_err(|_| Error::InvalidDate(text.to_string()))?;
        // The unit's first letter is unambiguous across the whole grammar.
        let unit_seconds = match &captures[2][..1] {
            "m" => 60,
            "h" => 3_600,
            "d" => 86_400,
            "w" => 604_800,
            _ => unreachable!("unit alternation starts with m, h, d or w"),
        };
        return Ok(Some(now.timestamp_millis() - amount * unit_seconds * 1_000));
    }

    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Ok(Some(date.with_timezone(&Utc).timestamp_millis()));
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(Some(naive.and_utc().timestamp_millis()));
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Ok(Some(date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()));
        }
    }

    Err(Error::InvalidDate(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_absent_input_is_unbounded() {
        assert_eq!(resolve(None, noon()).unwrap(), None);
        assert_eq!(resolve(Some(""), noon()).unwrap(), None);
        assert_eq!(resolve(Some("   "), noon()).unwrap(), None);
    }

    #[test]
    fn test_two_hours_ago() {
        let expected = Utc
            .with_ymd_and_hms(2024, 1, 1, 10, 0, 0)
            .unwrap()
            .timestamp_millis();

        assert_eq!(resolve(Some("2h ago"), noon()).unwrap(), Some(expected));
        assert_eq!(resolve(Some("2h"), noon()).unwrap(), Some(expected));
        assert_eq!(resolve(Some("2 hours ago"), noon()).unwrap(), Some(expected));
    }

    #[test]
    fn test_relative_units() {
        let now = noon();
        let now_ms = now.timestamp_millis();

        assert_eq!(resolve(Some("5m"), now).unwrap(), Some(now_ms - 5 * 60_000));
        assert_eq!(
            resolve(Some("3 days ago"), now).unwrap(),
            Some(now_ms - 3 * 86_400_000)
        );
        assert_eq!(
            resolve(Some("1w"), now).unwrap(),
            Some(now_ms - 604_800_000)
        );
    }

    #[test]
    fn test_resolution_is_idempotent_for_fixed_now() {
        let now = noon();
        assert_eq!(
            resolve(Some("1w"), now).unwrap(),
            resolve(Some("1w"), now).unwrap()
        );
    }

    #[test]
    fn test_rfc3339_offset_converted_to_utc() {
        let expected = Utc
            .with_ymd_and_hms(2024, 1, 1, 8, 0, 0)
            .unwrap()
            .timestamp_millis();

        assert_eq!(
            resolve(Some("2024-01-01T10:00:00+02:00"), noon()).unwrap(),
            Some(expected)
        );
    }

    #[test]
    fn test_naive_datetime_taken_as_utc() {
        let expected = Utc
            .with_ymd_and_hms(2024, 1, 1, 10, 30, 0)
            .unwrap()
            .timestamp_millis();

        assert_eq!(
            resolve(Some("2024-01-01 10:30:00"), noon()).unwrap(),
            Some(expected)
        );
        assert_eq!(
            resolve(Some("2024-01-01 10:30"), noon()).unwrap(),
            Some(expected)
        );
    }

    #[test]
    fn test_bare_dates_resolve_to_midnight() {
        let expected = Utc
            .with_ymd_and_hms(2024, 3, 5, 0, 0, 0)
            .unwrap()
            .timestamp_millis();

        assert_eq!(resolve(Some("2024-03-05"), noon()).unwrap(), Some(expected));
        assert_eq!(resolve(Some("05/03/2024"), noon()).unwrap(), Some(expected));
    }

    #[test]
    fn test_unparseable_input_is_invalid_date() {
        let err = resolve(Some("next thursday"), noon()).unwrap_err();
        assert!(matches!(err, Error::InvalidDate(text) if text == "next thursday"));
    }
}
