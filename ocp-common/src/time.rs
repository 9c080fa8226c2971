//! Week and day-of-week helpers
//!
//! Weeks start on Sunday. Day indices run Sunday(0) through Saturday(6).

use chrono::{Datelike, Duration, NaiveDate};

/// Days in a planning week
pub const DAYS_PER_WEEK: usize = 7;

/// Day index of a date, Sunday = 0
pub fn day_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Normalize any date to the Sunday that starts its week
pub fn week_start_for(date: NaiveDate) -> NaiveDate {
    date - Duration::days(day_index(date) as i64)
}

/// Calendar date of a day index within a week
pub fn date_for_day(week_start: NaiveDate, day: u8) -> NaiveDate {
    week_start + Duration::days(day as i64)
}

/// Whole days from `earlier` to `later` (negative if reversed)
pub fn days_between(earlier: NaiveDate, later: NaiveDate) -> i64 {
    (later - earlier).num_days()
}

/// Short English day name for log output
pub fn day_name(day: u8) -> &'static str {
    match day {
        0 => "Sun",
        1 => "Mon",
        2 => "Tue",
        3 => "Wed",
        4 => "Thu",
        5 => "Fri",
        6 => "Sat",
        _ => "???",
    }
}
