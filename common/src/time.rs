//! UTC calendar-date helpers.
//!
//! Every rate in RateBank is keyed by a UTC calendar date: a stored rate for
//! date `D` is the closing rate at 23:59:59 UTC on `D`. The helpers here are
//! the single place that opinion lives.

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, Utc};

/// Wire format for all date keys (store fields, provider URLs).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format a date in the canonical `YYYY-MM-DD` form.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a canonical `YYYY-MM-DD` date string.
pub fn parse_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
}

/// The most recent fully-closed UTC calendar date.
///
/// A day's closing rate only exists once processing has moved past that
/// day's UTC midnight, so "latest" always means yesterday in UTC.
pub fn yesterday_utc() -> NaiveDate {
    Utc::now().date_naive() - Days::new(1)
}

/// The calendar month containing `date`, clipped at the upper end to `max`.
///
/// Returns `(first_of_month, min(last_of_month, max))`.
pub fn month_window(date: NaiveDate, max: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = date.with_day(1).unwrap_or(date);
    let next_month = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    };
    let end = next_month.map(|d| d - Days::new(1)).unwrap_or(date);
    (start, end.min(max))
}

/// A moment in time normalized to its UTC calendar date.
///
/// Public entry points accept `impl Into<RateDate>`, so callers may pass a
/// plain `NaiveDate` (used as-is) or a timestamp (converted to its UTC
/// calendar date first). No timezone other than UTC is ever consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RateDate(NaiveDate);

impl RateDate {
    /// The normalized UTC calendar date.
    pub fn date(self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for RateDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl From<DateTime<Utc>> for RateDate {
    fn from(ts: DateTime<Utc>) -> Self {
        Self(ts.date_naive())
    }
}

impl From<DateTime<FixedOffset>> for RateDate {
    fn from(ts: DateTime<FixedOffset>) -> Self {
        Self(ts.with_timezone(&Utc).date_naive())
    }
}

impl std::fmt::Display for RateDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format_date(self.0))
    }
}
