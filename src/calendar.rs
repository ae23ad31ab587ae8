//! Calendar-correct duration arithmetic.
//!
//! [`compute_duration`] splits the span between two instants into years,
//! months, days, hours, minutes, seconds and milliseconds the way a person
//! reads a calendar: month and day lengths vary (including leap Februaries),
//! and a negative field borrows from the next larger one using the length of
//! the month before the target's month. The whole-day count is tracked
//! separately so a display can show "days until" without reassembling months.

use core::fmt;

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::time::Instant;
use crate::types::CountdownUnit;

const MONTH_LENGTHS: [u8; 12] = [
    /* Jan */ 31, /* Feb */ 28, /* Mar */ 31, /* Apr */ 30, /* May */ 31, /* Jun */ 30,
    /* Jul */ 31, /* Aug */ 31, /* Sep */ 30, /* Oct */ 31, /* Nov */ 30, /* Dec */ 31,
];

/// Calendar arithmetic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalendarError {
    /// Month index outside `0..=11`.
    InvalidMonth(u32),
}

impl fmt::Display for CalendarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarError::InvalidMonth(month) => {
                write!(f, "month index {} is outside 0-11", month)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CalendarError {}

/// Duration between two instants broken down along calendar boundaries.
///
/// `days` is the remainder after whole months; `total_days` is the whole
/// calendar-day count between the two dates, less one when the target's
/// time of day is earlier than the origin's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalendarDuration {
    pub years: i64,
    pub months: i64,
    pub days: i64,
    pub total_days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub milliseconds: i64,
}

impl CalendarDuration {
    /// Returns the value of a single field.
    pub fn get(&self, unit: CountdownUnit) -> i64 {
        match unit {
            CountdownUnit::Milliseconds => self.milliseconds,
            CountdownUnit::Seconds => self.seconds,
            CountdownUnit::Minutes => self.minutes,
            CountdownUnit::Hours => self.hours,
            CountdownUnit::Days => self.days,
            CountdownUnit::Months => self.months,
            CountdownUnit::Years => self.years,
            CountdownUnit::TotalDays => self.total_days,
        }
    }
}

/// Compact summary such as `11d 0h 0m 0s`. Leading zero units are dropped,
/// seconds are always shown.
impl fmt::Display for CalendarDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut greatest_unit_found = false;

        if self.total_days != 0 {
            greatest_unit_found = true;
            write!(f, "{}d ", self.total_days)?;
        }

        if self.hours != 0 || greatest_unit_found {
            greatest_unit_found = true;
            write!(f, "{}h ", self.hours)?;
        }

        if self.minutes != 0 || greatest_unit_found {
            write!(f, "{}m ", self.minutes)?;
        }

        write!(f, "{}s", self.seconds)
    }
}

/// Returns true for Gregorian leap years.
#[inline]
pub fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in a month, `0..=11` meaning January through December.
pub fn days_in_month(month: u32, is_leap_year: bool) -> Result<u8, CalendarError> {
    if month > 11 {
        return Err(CalendarError::InvalidMonth(month));
    }
    Ok(month_length(month as usize, is_leap_year))
}

fn month_length(month: usize, is_leap_year: bool) -> u8 {
    if month == 1 && is_leap_year {
        29
    } else {
        MONTH_LENGTHS[month % 12]
    }
}

/// Day count similar to a Julian day number. Only differences between two
/// results are meaningful.
pub fn day_number(year: i64, month: u32, day: u32) -> i64 {
    let mut y = year;
    let mut m = i64::from(month) + 1;

    if m <= 2 {
        y -= 1;
        m += 12;
    }

    365 * y + y.div_euclid(4) - y.div_euclid(100) + y.div_euclid(400) + (153 * m - 457) / 5
        + i64::from(day)
        - 306
}

#[derive(Debug, Clone, Copy)]
struct DateTimeUnits {
    year: i64,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    millisecond: u32,
}

impl DateTimeUnits {
    fn from_instant(instant: Instant) -> Self {
        let millis = instant.as_unix_millis();
        let datetime = DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or(if millis < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        });

        Self {
            year: i64::from(datetime.year()),
            month: datetime.month0(),
            day: datetime.day(),
            hour: datetime.hour(),
            minute: datetime.minute(),
            second: datetime.second(),
            millisecond: datetime.timestamp_subsec_millis().min(999),
        }
    }

    fn day_number(&self) -> i64 {
        day_number(self.year, self.month, self.day)
    }
}

#[inline]
fn diff(to: u32, from: u32) -> i64 {
    i64::from(to) - i64::from(from)
}

/// Computes the calendar duration from `from` to `to`.
///
/// Adding the resulting years and months to `from`'s date, then the days,
/// hours, minutes, seconds and milliseconds yields `to`. Days past the end of
/// the month reached by adding months roll over into the next one. When `from`
/// is later than `to` the fields describe a negative span and `total_days`
/// goes negative.
pub fn compute_duration(from: Instant, to: Instant) -> CalendarDuration {
    let from = DateTimeUnits::from_instant(from);
    let to = DateTimeUnits::from_instant(to);

    let mut milliseconds = diff(to.millisecond, from.millisecond);
    let mut seconds = diff(to.second, from.second);
    let mut minutes = diff(to.minute, from.minute);
    let mut hours = diff(to.hour, from.hour);
    let mut days = diff(to.day, from.day);
    let mut months = diff(to.month, from.month);
    let mut years = to.year - from.year;
    let mut total_days = to.day_number() - from.day_number();

    if milliseconds < 0 {
        milliseconds += 1000;
        seconds -= 1;
    }
    if seconds < 0 {
        seconds += 60;
        minutes -= 1;
    }
    if minutes < 0 {
        minutes += 60;
        hours -= 1;
    }
    if hours < 0 {
        hours += 24;
        total_days -= 1;
        days -= 1;
    }
    // Borrow from the months preceding the target's month until the day
    // remainder is non-negative. A 31st can need two borrows (31 Jan to 1 Mar).
    let (mut borrow_year, mut borrow_month) = (to.year, to.month);
    while days < 0 {
        if borrow_month == 0 {
            borrow_year -= 1;
            borrow_month = 11;
        } else {
            borrow_month -= 1;
        }
        days += i64::from(month_length(borrow_month as usize, is_leap_year(borrow_year)));
        months -= 1;
    }
    if months < 0 {
        months += 12;
        years -= 1;
    }

    CalendarDuration {
        years,
        months,
        days,
        total_days,
        hours,
        minutes,
        seconds,
        milliseconds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    extern crate std;
    use std::format;

    fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Instant {
        let datetime = Utc
            .with_ymd_and_hms(year, month, day, hour, minute, second)
            .unwrap();
        Instant::from_unix_millis(datetime.timestamp_millis())
    }

    fn summary(from: Instant, to: Instant) -> std::string::String {
        format!("{}", compute_duration(from, to))
    }

    #[test]
    fn identical_instants_are_zero() {
        let a = at(12345, 1, 2, 3, 4, 5);
        assert_eq!(compute_duration(a, a), CalendarDuration::default());
        assert_eq!(summary(a, a), "0s");
    }

    #[test]
    fn seconds_only() {
        let a = at(2025, 1, 1, 0, 0, 0);
        let b = at(2025, 1, 1, 0, 0, 42);
        assert_eq!(summary(a, b), "42s");
    }

    #[test]
    fn minutes_and_seconds() {
        let a = at(2023, 4, 3, 0, 0, 0);
        let b = at(2023, 4, 3, 0, 17, 2);
        assert_eq!(summary(a, b), "17m 2s");
    }

    #[test]
    fn hours_minutes_seconds() {
        let a = at(6, 7, 8, 2, 0, 0);
        let b = at(6, 7, 8, 23, 55, 33);
        assert_eq!(summary(a, b), "21h 55m 33s");
    }

    #[test]
    fn eleven_days() {
        let a = at(3333, 1, 1, 0, 0, 0);
        let b = at(3333, 1, 12, 0, 0, 0);
        assert_eq!(summary(a, b), "11d 0h 0m 0s");
    }

    #[test]
    fn common_and_leap_years_have_different_day_totals() {
        assert_eq!(
            summary(at(2025, 1, 1, 0, 0, 0), at(2026, 1, 1, 0, 0, 0)),
            "365d 0h 0m 0s"
        );
        assert_eq!(
            summary(at(2028, 1, 1, 0, 0, 0), at(2029, 1, 1, 0, 0, 0)),
            "366d 0h 0m 0s"
        );
    }

    #[test]
    fn long_spans_count_every_day() {
        assert_eq!(
            summary(at(2025, 1, 1, 0, 0, 0), at(2027, 9, 28, 0, 0, 0)),
            "1000d 0h 0m 0s"
        );
        assert_eq!(
            summary(at(1930, 4, 3, 1, 1, 1), at(1964, 1, 20, 2, 2, 2)),
            "12345d 1h 1m 1s"
        );
    }

    #[test]
    fn borrowing_cascades_through_every_unit() {
        let a = at(2006, 11, 6, 20, 33, 15);
        let b = at(2025, 8, 17, 7, 27, 49);
        assert_eq!(summary(a, b), "6858d 10h 54m 34s");

        let duration = compute_duration(a, b);
        assert_eq!(duration.years, 18);
        assert_eq!(duration.months, 9);
        assert_eq!(duration.days, 10);
    }

    #[test]
    fn end_of_month_origin_borrows_twice() {
        let duration = compute_duration(at(2025, 1, 31, 0, 0, 0), at(2025, 3, 1, 0, 0, 0));
        assert_eq!(duration.months, 0);
        assert_eq!(duration.days, 29);
        assert_eq!(duration.total_days, 29);
    }

    #[test]
    fn month_lengths_follow_the_table() {
        assert_eq!(days_in_month(0, false), Ok(31));
        assert_eq!(days_in_month(1, false), Ok(28));
        assert_eq!(days_in_month(1, true), Ok(29));
        assert_eq!(days_in_month(8, true), Ok(30));
        assert_eq!(days_in_month(11, false), Ok(31));
        assert_eq!(days_in_month(12, false), Err(CalendarError::InvalidMonth(12)));
    }

    #[test]
    fn leap_year_rule() {
        assert!(is_leap_year(2024));
        assert!(is_leap_year(2000));
        assert!(!is_leap_year(1900));
        assert!(!is_leap_year(2023));
    }

    #[test]
    fn day_number_matches_chrono_day_count() {
        let a = chrono::NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
        let b = chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let expected = i64::from(b.num_days_from_ce() - a.num_days_from_ce());
        assert_eq!(day_number(2024, 2, 1) - day_number(1999, 11, 31), expected);
    }
}
