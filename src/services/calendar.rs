// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Date-range arithmetic shared by stats and streak computation.

use chrono::{DateTime, NaiveDate, Timelike, Utc};

use crate::error::{AppError, Result};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Inclusive number of days spanned by `start..=end`.
///
/// Whole elapsed days plus one, plus one more when `end`'s hour of day
/// (UTC) is earlier than `start`'s: a challenge started late in the day
/// and checked early on a later day has rolled over one extra calendar day.
///
/// `end` must not be before `start`.
pub fn total_days(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let elapsed_ms = (end - start).num_milliseconds();
    let day_diff = elapsed_ms.div_euclid(MILLIS_PER_DAY);

    if end.hour() < start.hour() {
        day_diff + 2
    } else {
        day_diff + 1
    }
}

/// Signed number of calendar days from `earlier` to `later`.
pub fn day_diff(earlier: NaiveDate, later: NaiveDate) -> i64 {
    (later - earlier).num_days()
}

/// Parse a client-supplied date into a calendar day.
///
/// Accepts `YYYY-MM-DD` or a full RFC3339 timestamp, whose time of day is
/// dropped (the date is taken as written, before any zone conversion).
pub fn normalize_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .map_err(|_| {
            AppError::BadRequest(format!(
                "Invalid date '{}': expected YYYY-MM-DD or RFC3339",
                raw
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_same_instant_is_one_day() {
        let t = at(2024, 3, 15, 17);
        assert_eq!(total_days(t, t), 1);
    }

    #[test]
    fn test_equal_hours() {
        // Nine elapsed days, same hour
        assert_eq!(total_days(at(2024, 1, 1, 0), at(2024, 1, 10, 0)), 10);
    }

    #[test]
    fn test_hour_rollover_adds_a_day() {
        // Started 22:00, checked 08:00 the next morning: 10 hours elapsed,
        // but two calendar days touched.
        assert_eq!(total_days(at(2024, 1, 1, 22), at(2024, 1, 2, 8)), 2);
        // Later hour on the end side: no correction
        assert_eq!(total_days(at(2024, 1, 1, 8), at(2024, 1, 2, 22)), 2);
        assert_eq!(total_days(at(2024, 1, 1, 8), at(2024, 1, 1, 22)), 1);
    }

    #[test]
    fn test_total_days_at_least_one_for_ordered_ranges() {
        let start = at(2024, 2, 28, 13);
        for minutes in [0, 1, 59, 60 * 11, 60 * 24 - 1, 60 * 24, 60 * 24 * 400] {
            let end = start + Duration::minutes(minutes);
            assert!(total_days(start, end) >= 1, "minutes={}", minutes);
        }
    }

    #[test]
    fn test_normalize_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(normalize_date("2024-01-15").unwrap(), expected);
        assert_eq!(normalize_date(" 2024-01-15 ").unwrap(), expected);
        assert_eq!(normalize_date("2024-01-15T23:59:00Z").unwrap(), expected);
        assert_eq!(normalize_date("2024-01-15T01:00:00+09:00").unwrap(), expected);

        assert!(matches!(
            normalize_date("15/01/2024"),
            Err(AppError::BadRequest(_))
        ));
        assert!(normalize_date("2024-02-30").is_err());
    }

    #[test]
    fn test_day_diff() {
        let a = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(day_diff(a, b), 2);
        assert_eq!(day_diff(b, a), -2);
    }
}
