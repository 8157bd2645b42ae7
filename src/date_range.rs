//! Calendar helpers for inclusive date ranges and month arithmetic.

use serde::Deserialize;
use time::{Date, Month, format_description::BorrowedFormatItem, macros::format_description};

use crate::{Error, timezone::local_today};

const ISO_DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

// Serializes dates as "2025-01-31" rather than time's default tuple representation.
time::serde::format_description!(pub iso_date, Date, "[year]-[month]-[day]");

/// Parse a date such as "2025-01-31".
///
/// # Errors
/// Returns [Error::InvalidDate] if `text` is not a valid ISO 8601 calendar date.
pub fn parse_iso_date(text: &str) -> Result<Date, Error> {
    Date::parse(text.trim(), ISO_DATE_FORMAT).map_err(|_| Error::InvalidDate(text.to_owned()))
}

/// An inclusive range of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Date,
    pub end: Date,
}

impl DateRange {
    /// Create a range, checking that `end` does not come before `start`.
    ///
    /// # Errors
    /// Returns [Error::InvalidDateRange] if `end` is before `start`.
    pub fn new(start: Date, end: Date) -> Result<Self, Error> {
        if end < start {
            return Err(Error::InvalidDateRange { start, end });
        }

        Ok(Self { start, end })
    }

    /// Whether two inclusive ranges share at least one day.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Query parameters selecting a calendar month, e.g. `?year=2025&month=2`.
///
/// Missing parameters default to the current local year and month.
#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    pub year: Option<i32>,
    pub month: Option<u8>,
}

impl MonthQuery {
    /// Resolve the query into the bounds of a month.
    ///
    /// # Errors
    /// Returns an [Error::InvalidDate] if the month is not between 1 and 12,
    /// or an [Error::InvalidTimezoneError] if `local_timezone` is not a valid timezone.
    pub fn resolve(&self, local_timezone: &str) -> Result<DateRange, Error> {
        let today = local_today(local_timezone)?;
        let year = self.year.unwrap_or(today.year());
        let month = match self.month {
            Some(number) => Month::try_from(number)
                .map_err(|_| Error::InvalidDate(format!("{year}-{number}")))?,
            None => today.month(),
        };

        month_bounds(year, month)
    }
}

/// The first and last day of `month` in `year`.
///
/// # Errors
/// Returns [Error::InvalidDate] if `year` is outside the supported range.
pub fn month_bounds(year: i32, month: Month) -> Result<DateRange, Error> {
    let invalid_date = || Error::InvalidDate(format!("{year}-{}", month as u8));
    let start = Date::from_calendar_date(year, month, 1).map_err(|_| invalid_date())?;
    let end = Date::from_calendar_date(year, month, last_day_of_month(year, month))
        .map_err(|_| invalid_date())?;

    Ok(DateRange { start, end })
}

/// The date `months` months after `date` on the day `anchor_day`, clamped to
/// the end of the target month.
///
/// Clamping does not accumulate: advancing Jan 31 by one month with an anchor
/// of 31 gives Feb 28 (or 29), and by two months gives Mar 31.
///
/// Returns `None` if the result is outside the supported date range.
pub fn add_months_clamped(date: Date, months: u32, anchor_day: u8) -> Option<Date> {
    let month_index = date.month() as i64 - 1 + months as i64;
    let year = date.year() as i64 + month_index.div_euclid(12);
    let year = i32::try_from(year).ok()?;
    let month = Month::try_from((month_index.rem_euclid(12) + 1) as u8).ok()?;
    let day = anchor_day.min(last_day_of_month(year, month));

    Date::from_calendar_date(year, month, day).ok()
}

/// The number of days in `month` of `year`.
pub fn last_day_of_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}
