//! Week and period utilities
//!
//! Monday-start weeks and ISO-8601 week numbers, all computed in UTC.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// ISO-8601 week number of a calendar date.
///
/// The date is shifted to the Thursday of its week; the week number is that
/// Thursday's ordinal week within its own year.
pub fn iso_week_number(date: NaiveDate) -> u32 {
    let days_from_monday = date.weekday().num_days_from_monday() as i64;
    let thursday = date + Duration::days(3 - days_from_monday);
    (thursday.ordinal0() / 7) + 1
}

/// Monday on or before the given date. Sunday belongs to the week before.
pub fn week_start_date(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// A Monday-to-Sunday period, inclusive of its last millisecond
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl WeekRange {
    /// The week containing the given instant.
    pub fn containing(instant: DateTime<Utc>) -> Self {
        Self::starting_on(week_start_date(instant.date_naive()))
    }

    /// The week starting on the Monday of `date`'s week.
    pub fn for_date(date: NaiveDate) -> Self {
        Self::starting_on(week_start_date(date))
    }

    fn starting_on(monday: NaiveDate) -> Self {
        let start = monday.and_time(chrono::NaiveTime::MIN).and_utc();
        let end = start + Duration::days(7) - TimeDelta::milliseconds(1);
        Self { start, end }
    }

    /// Shift by a whole number of weeks (negative goes back).
    ///
    /// `None` when the shifted week falls outside the representable range.
    pub fn shifted(&self, weeks: i64) -> Option<Self> {
        let offset = weeks.checked_mul(7).and_then(TimeDelta::try_days)?;
        Some(Self {
            start: self.start.checked_add_signed(offset)?,
            end: self.end.checked_add_signed(offset)?,
        })
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end.date_naive()
    }

    pub fn iso_week(&self) -> u32 {
        iso_week_number(self.start_date())
    }

    /// e.g. `"Jun 2 - Jun 8, 2025"`
    pub fn label(&self) -> String {
        format!(
            "{} - {}",
            self.start.format("%b %-d"),
            self.end.format("%b %-d, %Y")
        )
    }
}
