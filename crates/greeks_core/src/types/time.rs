//! Timestamp handling for observation series.
//!
//! This module provides:
//! - Parsing of timezone-naive observation timestamps in the formats found in
//!   exported market data files
//! - ISO-8601 normalisation for response payloads
//! - Time-to-expiry as an ACT/365 year fraction measured in seconds
//!
//! # Examples
//!
//! ```
//! use greeks_core::types::time::{parse_expiry, parse_timestamp, time_to_expiry};
//!
//! let observed = parse_timestamp("2024-06-26 00:00:00").unwrap();
//! let expiry = parse_expiry("2024-06-27").unwrap();
//!
//! // One day out
//! let t = time_to_expiry(expiry, observed);
//! assert!((t - 1.0 / 365.0).abs() < 1e-12);
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use super::error::DateError;

/// Seconds in the 365-day year used for time-to-expiry.
pub const SECONDS_PER_YEAR: f64 = 365.0 * 24.0 * 3600.0;

/// Naive formats, tried in order. `%.f` also matches an absent fraction.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Offset-carrying formats; the offset is dropped and the local clock time kept.
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Parses an observation timestamp.
///
/// Accepts `YYYY-MM-DD HH:MM:SS[.fff]`, the `T`-separated equivalent,
/// minute-resolution variants, and RFC 3339 / offset-suffixed values. For
/// values with an offset the local wall-clock time is returned, so the
/// time-of-day seen by filters is the one written in the file.
///
/// # Errors
/// `DateError::ParseError` when no format matches.
///
/// # Examples
/// ```
/// use greeks_core::types::time::parse_timestamp;
///
/// let a = parse_timestamp("2024-01-02 09:15:00").unwrap();
/// let b = parse_timestamp("2024-01-02T09:15:00+05:30").unwrap();
/// assert_eq!(a, b);
/// ```
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, DateError> {
    let s = s.trim();

    for fmt in NAIVE_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(ts);
        }
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.naive_local());
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(s, fmt) {
            return Ok(ts.naive_local());
        }
    }

    Err(DateError::ParseError(format!("unrecognised timestamp '{s}'")))
}

/// Parses an ISO expiry date (`YYYY-MM-DD`).
pub fn parse_expiry(s: &str) -> Result<NaiveDate, DateError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| DateError::ParseError(format!("invalid expiry '{s}': {e}")))
}

/// Normalises a timestamp to ISO-8601.
///
/// Microseconds are appended only when the sub-second part is non-zero.
///
/// # Examples
/// ```
/// use greeks_core::types::time::{format_timestamp, parse_timestamp};
///
/// let ts = parse_timestamp("2024-01-02 09:15:00").unwrap();
/// assert_eq!(format_timestamp(&ts), "2024-01-02T09:15:00");
/// ```
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    if ts.nanosecond() == 0 {
        ts.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        ts.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

/// Expiry date interpreted at the start of day.
#[inline]
pub fn expiry_datetime(expiry: NaiveDate) -> NaiveDateTime {
    expiry.and_time(NaiveTime::MIN)
}

/// Time to expiry in years: `(expiry at midnight - observed) / 365 days`.
///
/// Negative once the observation is past expiry midnight.
pub fn time_to_expiry(expiry: NaiveDate, observed: NaiveDateTime) -> f64 {
    let delta = expiry_datetime(expiry) - observed;
    let seconds = match delta.num_nanoseconds() {
        Some(nanos) => nanos as f64 / 1e9,
        None => delta.num_seconds() as f64,
    };
    seconds / SECONDS_PER_YEAR
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Duration;

    fn ts(y: i32, m: u32, d: u32, hh: u32, mm: u32, ss: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(hh, mm, ss)
            .unwrap()
    }

    #[test]
    fn test_parse_space_and_t_separated() {
        let expected = ts(2024, 3, 1, 9, 15, 0);
        assert_eq!(parse_timestamp("2024-03-01 09:15:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-01T09:15:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-01 09:15").unwrap(), expected);
    }

    #[test]
    fn test_parse_fractional_seconds() {
        let parsed = parse_timestamp("2024-03-01 09:15:00.250").unwrap();
        assert_eq!(parsed.nanosecond(), 250_000_000);
    }

    #[test]
    fn test_parse_offset_keeps_local_clock() {
        let parsed = parse_timestamp("2024-03-01T09:15:00+05:30").unwrap();
        assert_eq!(parsed, ts(2024, 3, 1, 9, 15, 0));
        let parsed = parse_timestamp("2024-03-01 09:15:00+05:30").unwrap();
        assert_eq!(parsed, ts(2024, 3, 1, 9, 15, 0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_err());
        assert!(parse_timestamp("").is_err());
        assert!(parse_expiry("2024-13-01").is_err());
    }

    #[test]
    fn test_format_whole_and_fractional() {
        assert_eq!(format_timestamp(&ts(2024, 1, 2, 3, 4, 5)), "2024-01-02T03:04:05");
        let frac = ts(2024, 1, 2, 3, 4, 5) + Duration::microseconds(1500);
        assert_eq!(format_timestamp(&frac), "2024-01-02T03:04:05.001500");
    }

    #[test]
    fn test_time_to_expiry_zero_at_midnight() {
        let expiry = NaiveDate::from_ymd_opt(2024, 6, 27).unwrap();
        assert_eq!(time_to_expiry(expiry, ts(2024, 6, 27, 0, 0, 0)), 0.0);
    }

    #[test]
    fn test_time_to_expiry_one_second() {
        let expiry = NaiveDate::from_ymd_opt(2024, 6, 27).unwrap();
        let t = time_to_expiry(expiry, ts(2024, 6, 26, 23, 59, 59));
        assert!(t > 0.0);
        assert_relative_eq!(t, 1.0 / SECONDS_PER_YEAR, epsilon = 1e-18);
    }

    #[test]
    fn test_time_to_expiry_negative_after_expiry() {
        let expiry = NaiveDate::from_ymd_opt(2024, 6, 27).unwrap();
        assert!(time_to_expiry(expiry, ts(2024, 6, 27, 9, 15, 0)) < 0.0);
    }

    #[test]
    fn test_time_to_expiry_full_year() {
        let expiry = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let t = time_to_expiry(expiry, ts(2024, 1, 1, 0, 0, 0));
        // 2024 is a leap year: 366 / 365
        assert_relative_eq!(t, 366.0 / 365.0, epsilon = 1e-12);
    }
}
