//! Calendar arithmetic on [`DateTimeValue`].
//!
//! Date deltas are applied years → months → days. Month overflow carries
//! into the year with floored division, so `-1` month from January lands in
//! December of the previous year. After the month step the day is clamped
//! once to the last day of the resulting month (January 31 + 1 month is
//! February 28 or 29); the day delta is applied afterwards as plain calendar
//! days.
//!
//! Time deltas carry seconds → minutes → hours → days with the same floored
//! modulo, so `-1` hour from `00:10` is `23:10` on the previous day.
//!
//! Both operations mutate the value in place and return `&mut Self` so they
//! can be chained with `?`. A shifted month followed by the reverse shift
//! does not restore a clamped day: 2018-01-31 + 1 month - 1 month is
//! 2018-01-28.

use chrono::{Datelike, Days, NaiveDate, NaiveTime, Timelike};

use crate::error::{AlmanacError, Result};
use crate::value::DateTimeValue;

impl DateTimeValue {
    /// Add signed year, month and day deltas, in that order.
    ///
    /// # Errors
    ///
    /// Returns [`AlmanacError::OutOfRange`] if the result leaves the
    /// supported calendar range. The value is left unchanged in that case.
    ///
    /// # Examples
    ///
    /// ```
    /// use almanac::{DateTimeValue, Zone};
    ///
    /// let mut value = DateTimeValue::from_fields(2018, 1, 31, 0, 0, 0, Zone::utc()).unwrap();
    /// value.modify_date(0, 1, 0).unwrap();
    /// assert_eq!(value.to_date_string(), "2018-02-28");
    /// ```
    pub fn modify_date(&mut self, years: i64, months: i64, days: i64) -> Result<&mut Self> {
        let date = shift_months(self.date(), years, months)?;
        let date = add_days(date, days)?;
        self.set_local(date.and_time(self.naive_local().time()))?;
        Ok(self)
    }

    /// Add signed hour, minute and second deltas with floored carry into
    /// the date.
    ///
    /// # Errors
    ///
    /// Returns [`AlmanacError::OutOfRange`] if the result leaves the
    /// supported calendar range. The value is left unchanged in that case.
    pub fn modify_time(&mut self, hours: i64, minutes: i64, seconds: i64) -> Result<&mut Self> {
        let (day_carry, time) = carry_time(self.naive_local().time(), hours, minutes, seconds)?;
        let date = add_days(self.date(), day_carry)?;
        self.set_local(date.and_time(time))?;
        Ok(self)
    }
}

// ── Calendar helpers ────────────────────────────────────────────────────────

/// Whether `year` is a leap year in the proleptic Gregorian calendar.
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `month` (1-12) of `year`. Returns 0 for any other month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Floored division and modulo by a positive divisor.
///
/// The remainder is always in `0..divisor`, whatever the sign of `value`.
pub(crate) fn floor_div_mod(value: i64, divisor: i64) -> (i64, i64) {
    (value.div_euclid(divisor), value.rem_euclid(divisor))
}

/// Apply year and month deltas, then clamp the day to the resulting month.
pub(crate) fn shift_months(date: NaiveDate, years: i64, months: i64) -> Result<NaiveDate> {
    let overflow = || AlmanacError::OutOfRange(format!("{date} shifted by {years}y {months}mo"));

    let index = i64::from(date.month0())
        .checked_add(months)
        .ok_or_else(overflow)?;
    let (year_carry, month0) = floor_div_mod(index, 12);
    let year = i64::from(date.year())
        .checked_add(years)
        .and_then(|y| y.checked_add(year_carry))
        .and_then(|y| i32::try_from(y).ok())
        .ok_or_else(overflow)?;
    let month = month0 as u32 + 1;
    let day = date.day().min(days_in_month(year, month));

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(overflow)
}

/// Add a signed number of calendar days.
pub(crate) fn add_days(date: NaiveDate, days: i64) -> Result<NaiveDate> {
    let delta = Days::new(days.unsigned_abs());
    let shifted = if days >= 0 {
        date.checked_add_days(delta)
    } else {
        date.checked_sub_days(delta)
    };
    shifted.ok_or_else(|| AlmanacError::OutOfRange(format!("{date} shifted by {days} days")))
}

/// Add time deltas to a time of day, returning the whole days carried out.
fn carry_time(
    time: NaiveTime,
    hours: i64,
    minutes: i64,
    seconds: i64,
) -> Result<(i64, NaiveTime)> {
    let overflow =
        || AlmanacError::OutOfRange(format!("{time} shifted by {hours}h {minutes}m {seconds}s"));

    let total = i64::from(time.second())
        .checked_add(seconds)
        .ok_or_else(overflow)?;
    let (carry, second) = floor_div_mod(total, 60);

    let total = i64::from(time.minute())
        .checked_add(minutes)
        .and_then(|m| m.checked_add(carry))
        .ok_or_else(overflow)?;
    let (carry, minute) = floor_div_mod(total, 60);

    let total = i64::from(time.hour())
        .checked_add(hours)
        .and_then(|h| h.checked_add(carry))
        .ok_or_else(overflow)?;
    let (days, hour) = floor_div_mod(total, 24);

    let time = NaiveTime::from_hms_opt(hour as u32, minute as u32, second as u32)
        .ok_or_else(overflow)?;
    Ok((days, time))
}

// ── Tests ───────────────────────────────────────────────────────────────────
