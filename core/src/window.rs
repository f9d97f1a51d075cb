//! Generation window: an inclusive range of calendar days.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    /// Last day of the window; the whole day is included.
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Number of calendar days covered, counting both ends.
    /// Zero or negative means an inverted window.
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn day(&self, offset: i64) -> NaiveDate {
        self.start + Duration::days(offset)
    }

    /// Midnight at the start of the first day.
    pub fn start_datetime(&self) -> NaiveDateTime {
        self.start.and_time(NaiveTime::MIN)
    }

    /// Last second of the final day.
    pub fn end_datetime(&self) -> NaiveDateTime {
        self.start_datetime() + Duration::seconds(self.num_seconds() - 1)
    }

    pub fn num_seconds(&self) -> i64 {
        self.num_days() * SECONDS_PER_DAY
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        ts >= self.start_datetime() && ts <= self.end_datetime()
    }

    /// All days in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.num_days().max(0)).map(|i| self.day(i))
    }
}

/// Saturday and Sunday (weekday index >= 5, Monday = 0).
pub fn is_weekend(date: NaiveDate) -> bool {
    date.weekday().num_days_from_monday() >= 5
}

/// Weekday names in display order, Monday first.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
