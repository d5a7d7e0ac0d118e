//! Inclusive publication-date windows.
//!
//! Calendar dates are interpreted in UTC: a start date means 00:00:00 of that
//! day and an end date means the last instant of that day.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use sn_core::{Error, Result};

/// Trailing window used when a request names no dates.
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Longest trailing window accepted, about a century.
pub const MAX_WINDOW_DAYS: i64 = 36_500;

/// Wire format of `start_date` / `end_date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidDateRange(format!(
                "start {} is after end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    /// `[now - days, now]`
    pub fn trailing_days(now: DateTime<Utc>, days: i64) -> Result<Self> {
        if days <= 0 {
            return Err(Error::InvalidParameter(format!(
                "window must span at least one day, got {}",
                days
            )));
        }
        Self::new(days_before(now, days)?, now)
    }

    /// Build a window from optional `YYYY-MM-DD` strings.
    ///
    /// With neither date the window trails `now` by `window_days`. A lone start
    /// date runs up to `now`; a lone end date reaches back `window_days`.
    pub fn from_dates(
        start_date: Option<&str>,
        end_date: Option<&str>,
        now: DateTime<Utc>,
        window_days: i64,
    ) -> Result<Self> {
        let start = start_date.map(|s| parse_date("start_date", s)).transpose()?;
        let end = end_date.map(|s| parse_date("end_date", s)).transpose()?;

        match (start, end) {
            (None, None) => Self::trailing_days(now, window_days),
            (Some(start), None) => Self::new(start_of_day(start), now),
            (None, Some(end)) => {
                let end = end_of_day(end);
                Self::new(days_before(end, window_days)?, end)
            }
            (Some(start), Some(end)) => Self::new(start_of_day(start), end_of_day(end)),
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| {
        Error::InvalidDateRange(format!("{} {:?} is not a YYYY-MM-DD date: {}", field, value, e))
    })
}

fn days_before(at: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>> {
    Duration::try_days(days)
        .and_then(|span| at.checked_sub_signed(span))
        .ok_or_else(|| Error::InvalidParameter(format!("window of {} days is out of range", days)))
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + Duration::days(1) - Duration::nanoseconds(1)
}
