//! Time utilities: local wall-clock conversion, analysis periods and the
//! calendar predicates the pattern analysis relies on.

use anyhow::Result;
use chrono::{
    DateTime, Datelike, Days, Month, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta,
    Timelike, Utc, Weekday,
};
use chrono_tz::Tz;

use crate::transaction::Transaction;

/// Convert a UTC instant into wall-clock time in an IANA zone like "Asia/Kolkata".
pub fn to_local(utc: DateTime<Utc>, tz: &str) -> Result<NaiveDateTime> {
    let tz: Tz = tz
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))?;
    Ok(utc.with_timezone(&tz).naive_local())
}

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Parse the timestamp shapes we accept in statements and request bodies.
///
/// A bare date means midnight. RFC 3339 input keeps the wall-clock time of
/// its own offset.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d.and_time(NaiveTime::MIN));
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local())
}

/// Saturday or Sunday.
pub fn is_weekend(ts: NaiveDateTime) -> bool {
    matches!(ts.weekday(), Weekday::Sat | Weekday::Sun)
}

/// 20:00 up to (not including) 02:00, wrapping past midnight.
pub fn is_late_night(ts: NaiveDateTime) -> bool {
    let hour = ts.hour();
    hour >= 20 || hour < 2
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

/// Calendar-week bucket within a month, e.g. "2026-02-W3".
///
/// Week `n` is `ceil((day_of_month + weekday_of_the_1st) / 7)` with weekdays
/// counted from Sunday = 0, so buckets break on Sundays. The month is part
/// of the key so the same week number in different months never collides.
pub fn week_bucket_key(date: NaiveDate) -> String {
    let offset = first_of_month(date).weekday().num_days_from_sunday();
    let week = (date.day() + offset).div_ceil(7);
    format!("{}-{:02}-W{}", date.year(), date.month(), week)
}

/// English month name, e.g. "February".
pub fn month_name(date: NaiveDate) -> &'static str {
    u8::try_from(date.month())
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
        .unwrap_or("")
}

/// An inclusive time window supplied to an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Period {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// The calendar month containing `date`, from the 1st at 00:00 to the
    /// last instant of its final day.
    pub fn month_of(date: NaiveDate) -> Self {
        let first = first_of_month(date);
        let next = first
            .checked_add_months(Months::new(1))
            .unwrap_or(NaiveDate::MAX);
        Self {
            start: first.and_time(NaiveTime::MIN),
            end: next.and_time(NaiveTime::MIN) - TimeDelta::nanoseconds(1),
        }
    }

    /// The calendar month before the one containing `date`.
    pub fn previous_month_of(date: NaiveDate) -> Self {
        let prev = first_of_month(date)
            .checked_sub_months(Months::new(1))
            .unwrap_or(NaiveDate::MIN);
        Self::month_of(prev)
    }

    /// The `days` days leading up to and including `now`. A window reaching
    /// past the calendar's range starts at its earliest instant.
    pub fn trailing_days(now: NaiveDateTime, days: u32) -> Self {
        let start = now
            .checked_sub_signed(TimeDelta::days(i64::from(days)))
            .unwrap_or(NaiveDateTime::MIN);
        Self { start, end: now }
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        ts >= self.start && ts <= self.end
    }

    /// Transactions that fall inside this window, in input order.
    pub fn select(&self, txns: &[Transaction]) -> Vec<Transaction> {
        txns.iter()
            .filter(|t| self.contains(t.timestamp))
            .cloned()
            .collect()
    }

    /// Month name of the window's start.
    pub fn label(&self) -> &'static str {
        month_name(self.start.date())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_to_local_kolkata() {
        let utc = Utc.with_ymd_and_hms(2026, 2, 20, 18, 0, 0).unwrap();
        let local = to_local(utc, "Asia/Kolkata").unwrap();
        assert_eq!(local, at(2026, 2, 20, 23, 30));
        assert!(to_local(utc, "Mars/Olympus").is_err());
    }

    #[test]
    fn test_parse_timestamp_shapes() {
        assert_eq!(parse_timestamp("2026-02-20 23:30"), Some(at(2026, 2, 20, 23, 30)));
        assert_eq!(parse_timestamp("2026-02-20T01:30:00"), Some(at(2026, 2, 20, 1, 30)));
        assert_eq!(parse_timestamp("2026-02-20"), Some(at(2026, 2, 20, 0, 0)));
        assert_eq!(
            parse_timestamp("2026-02-20T23:30:00+05:30"),
            Some(at(2026, 2, 20, 23, 30))
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_late_night_wraps_midnight() {
        assert!(is_late_night(at(2026, 2, 20, 23, 30)));
        assert!(is_late_night(at(2026, 2, 21, 1, 30)));
        assert!(is_late_night(at(2026, 2, 21, 20, 0)));
        assert!(!is_late_night(at(2026, 2, 21, 2, 30)));
        assert!(!is_late_night(at(2026, 2, 21, 19, 59)));
    }

    #[test]
    fn test_weekend() {
        // 2026-02-21 is a Saturday
        assert!(is_weekend(at(2026, 2, 21, 10, 0)));
        assert!(is_weekend(at(2026, 2, 22, 10, 0)));
        assert!(!is_weekend(at(2026, 2, 23, 10, 0)));
    }

    #[test]
    fn test_week_bucket_key() {
        // February 2026 starts on a Sunday (offset 0)
        let feb = |d| NaiveDate::from_ymd_opt(2026, 2, d).unwrap();
        assert_eq!(week_bucket_key(feb(1)), "2026-02-W1");
        assert_eq!(week_bucket_key(feb(7)), "2026-02-W1");
        assert_eq!(week_bucket_key(feb(8)), "2026-02-W2");
        assert_eq!(week_bucket_key(feb(28)), "2026-02-W4");

        // March 2026 starts on a Sunday too; keys still differ by month
        let mar1 = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(week_bucket_key(mar1), "2026-03-W1");

        // January 2026 starts on a Thursday (offset 4): the 3rd is a Saturday, the 4th a Sunday
        let jan = |d| NaiveDate::from_ymd_opt(2026, 1, d).unwrap();
        assert_eq!(week_bucket_key(jan(3)), "2026-01-W1");
        assert_eq!(week_bucket_key(jan(4)), "2026-01-W2");
    }

    #[test]
    fn test_month_periods() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let current = Period::month_of(date);
        assert_eq!(current.start, at(2026, 3, 1, 0, 0));
        assert!(current.contains(at(2026, 3, 31, 23, 59)));
        assert!(!current.contains(at(2026, 4, 1, 0, 0)));
        assert_eq!(current.label(), "March");

        let previous = Period::previous_month_of(date);
        assert_eq!(previous.start, at(2026, 2, 1, 0, 0));
        assert!(previous.contains(at(2026, 2, 28, 23, 59)));
        assert!(!previous.contains(at(2026, 3, 1, 0, 0)));

        let january = Period::previous_month_of(NaiveDate::from_ymd_opt(2026, 1, 10).unwrap());
        assert_eq!(january.label(), "December");
        assert_eq!(january.start, at(2025, 12, 1, 0, 0));
    }

    #[test]
    fn test_trailing_window() {
        let now = at(2026, 3, 31, 12, 0);
        let window = Period::trailing_days(now, 30);
        assert!(window.contains(now));
        assert!(window.contains(at(2026, 3, 1, 12, 0)));
        assert!(!window.contains(at(2026, 3, 1, 11, 59)));
    }

    #[test]
    fn test_trailing_window_saturates() {
        let now = at(2026, 2, 18, 12, 0);
        let window = Period::trailing_days(now, u32::MAX);
        assert_eq!(window.start, NaiveDateTime::MIN);
        assert_eq!(window.end, now);
        assert!(window.contains(at(1970, 1, 1, 0, 0)));
    }
}
