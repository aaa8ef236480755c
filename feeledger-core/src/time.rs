//! Time utilities: calendar-day parsing and "today" in the school's timezone.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Current calendar day in an IANA tz like "Asia/Dhaka".
pub fn today_in(tz: &str) -> Result<NaiveDate> {
    let tz: Tz = tz
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))?;
    Ok(Utc::now().with_timezone(&tz).date_naive())
}

/// Parse a stored date into its calendar day.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 (day taken in the stamp's own offset),
/// naive `YYYY-MM-DDTHH:MM:SS[.f]` / `YYYY-MM-DD HH:MM:SS`, and `DD/MM/YYYY`.
pub fn parse_day(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(s, "%d/%m/%Y").ok()
}

/// UTC calendar day of a unix timestamp in seconds.
pub fn day_from_unix_seconds(secs: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp(secs, 0).map(|dt| dt.date_naive())
}

/// UTC calendar day of a unix timestamp in milliseconds.
pub fn day_from_unix_millis(millis: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_plain_and_iso() {
        assert_eq!(parse_day("2026-01-15"), Some(day(2026, 1, 15)));
        assert_eq!(parse_day("2026-01-15T23:10:00Z"), Some(day(2026, 1, 15)));
        assert_eq!(parse_day("2026-01-15T23:10:00.250"), Some(day(2026, 1, 15)));
        assert_eq!(parse_day("2026-01-15 08:00:00"), Some(day(2026, 1, 15)));
        assert_eq!(parse_day("15/01/2026"), Some(day(2026, 1, 15)));
    }

    #[test]
    fn test_rfc3339_keeps_local_day() {
        // 01:30 at +06:00 is still the 16th locally
        assert_eq!(parse_day("2026-01-16T01:30:00+06:00"), Some(day(2026, 1, 16)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_day(""), None);
        assert_eq!(parse_day("soon"), None);
    }

    #[test]
    fn test_unix_conversions() {
        assert_eq!(day_from_unix_seconds(1_768_435_200), Some(day(2026, 1, 15)));
        assert_eq!(day_from_unix_millis(1_768_435_200_000), Some(day(2026, 1, 15)));
    }

    #[test]
    fn test_today_in_rejects_bad_tz() {
        assert!(today_in("Mars/Olympus").is_err());
        assert!(today_in("Asia/Dhaka").is_ok());
    }
}
