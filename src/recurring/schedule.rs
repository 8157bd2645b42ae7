//! How often a recurring transaction repeats and when it is next due.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, Duration};

use crate::{Error, date_range::add_months_clamped};

/// How often a recurring transaction repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Every day.
    Daily,
    /// Every seven days.
    Weekly,
    /// On the same day every month, or the last day of shorter months.
    Monthly,
}

impl Frequency {
    /// The lowercase name used in JSON and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }
}

impl Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            _ => Err(Error::InvalidFrequency(s.to_owned())),
        }
    }
}

impl ToSql for Frequency {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Frequency {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// The occurrence after `date`.
///
/// Monthly occurrences fall on the day of `start_date`, or the last day of the
/// month for shorter months, so Jan 31 is followed by Feb 28 and then Mar 31.
///
/// Returns `None` if the next occurrence is past the last representable date.
pub fn next_occurrence(date: Date, frequency: Frequency, start_date: Date) -> Option<Date> {
    match frequency {
        Frequency::Daily => date.checked_add(Duration::days(1)),
        Frequency::Weekly => date.checked_add(Duration::weeks(1)),
        Frequency::Monthly => add_months_clamped(date, 1, start_date.day()),
    }
}
