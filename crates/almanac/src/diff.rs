//! Timezone-normalized differences between two values.
//!
//! Month counts are taken from wall-clock fields, so both operands must sit
//! at the same UTC offset first. Comparing wall clocks that belong to
//! different offsets (or converting them through the process's local zone)
//! gives wrong month counts as soon as the default zone is not UTC; the
//! reconciliation step here exists to avoid exactly that.

use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;
use tracing::debug;

use crate::arithmetic::shift_months;
use crate::error::{AlmanacError, Result};
use crate::value::DateTimeValue;
use crate::zone::{TimezoneContext, Zone};

/// The calendar distance from one value to another.
///
/// `months` counts whole months; the remaining fields break down what is
/// left after adding those months (with day clamping) to the earlier value.
/// Every field carries the sign of the interval: negative when the second
/// operand is earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Interval {
    pub months: i64,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    /// Exact elapsed seconds between the two instants.
    pub total_seconds: i64,
}

impl Interval {
    /// Whole years (months / 12, truncated toward zero).
    pub fn years(&self) -> i64 {
        self.months / 12
    }

    /// True when the second operand is earlier on the wall clock.
    pub fn is_negative(&self) -> bool {
        [self.months, self.days, self.hours, self.minutes, self.seconds]
            .iter()
            .any(|&n| n < 0)
    }

    /// Human-readable magnitude, e.g. "1 year, 2 months, 3 hours".
    pub fn human_readable(&self) -> String {
        let months = self.months.abs();
        let units = [
            (months / 12, "year"),
            (months % 12, "month"),
            (self.days.abs(), "day"),
            (self.hours.abs(), "hour"),
            (self.minutes.abs(), "minute"),
            (self.seconds.abs(), "second"),
        ];

        let parts: Vec<String> = units
            .iter()
            .filter(|(n, _)| *n > 0)
            .map(|(n, unit)| format!("{n} {unit}{}", if *n == 1 { "" } else { "s" }))
            .collect();

        if parts.is_empty() {
            "0 seconds".to_string()
        } else {
            parts.join(", ")
        }
    }
}

impl DateTimeValue {
    /// Calendar difference from `self` to `other`.
    ///
    /// Values in the same zone, or at the same UTC offset, are compared by
    /// wall clock directly, so a DST change between them does not cost or
    /// add an hour. Values at different offsets in different zones are a [`AlmanacError::TimezoneMismatch`] unless
    /// `allow_unequal_timezones` is set, in which case one side is moved:
    ///
    /// 1. if one side is at UTC, the other is moved into UTC;
    /// 2. otherwise the side whose offset is not the default zone's is moved
    ///    to the other side's offset;
    /// 3. if neither matches the default zone, `other` is moved to `self`'s
    ///    offset.
    ///
    /// # Examples
    ///
    /// ```
    /// use almanac::{resolve, TimezoneContext};
    ///
    /// let ctx = TimezoneContext::named("Europe/Berlin").unwrap();
    /// let feb = resolve("2019-02-01", &ctx, false).unwrap();
    /// let mar = resolve("2019-03-01", &ctx, false).unwrap();
    /// assert_eq!(feb.diff_constant(&mar, false, &ctx).unwrap().months, 1);
    /// ```
    pub fn diff_constant(
        &self,
        other: &DateTimeValue,
        allow_unequal_timezones: bool,
        ctx: &TimezoneContext,
    ) -> Result<Interval> {
        let (start, end) = reconcile(self, other, allow_unequal_timezones, ctx)?;
        let mut interval = interval_between(start.naive_local(), end.naive_local())?;
        interval.total_seconds = other.timestamp() - self.timestamp();
        Ok(interval)
    }
}

/// Bring both operands to the same offset, moving the deviant one.
fn reconcile(
    left: &DateTimeValue,
    right: &DateTimeValue,
    allow_unequal_timezones: bool,
    ctx: &TimezoneContext,
) -> Result<(DateTimeValue, DateTimeValue)> {
    if left.offset() == right.offset() || left.zone() == right.zone() {
        return Ok((left.clone(), right.clone()));
    }
    if !allow_unequal_timezones {
        return Err(AlmanacError::TimezoneMismatch {
            left: left.to_iso8601(),
            right: right.to_iso8601(),
        });
    }

    if left.is_utc() {
        debug!(deviant = %right, "moving right operand into UTC");
        return Ok((left.clone(), right.to_zone(Zone::utc())));
    }
    if right.is_utc() {
        debug!(deviant = %left, "moving left operand into UTC");
        return Ok((left.to_zone(Zone::utc()), right.clone()));
    }

    let on_baseline =
        |v: &DateTimeValue| ctx.default_offset_at(&v.instant().naive_utc()) == v.offset();
    if on_baseline(right) && !on_baseline(left) {
        debug!(deviant = %left, "moving left operand to the default zone's offset");
        Ok((left.to_zone(Zone::Fixed(right.offset())), right.clone()))
    } else {
        debug!(deviant = %right, "moving right operand to the left operand's offset");
        Ok((left.clone(), right.to_zone(Zone::Fixed(left.offset()))))
    }
}

/// Month-and-remainder difference between two wall-clock times.
fn interval_between(start: NaiveDateTime, end: NaiveDateTime) -> Result<Interval> {
    let negative = end < start;
    let (lo, hi) = if negative { (end, start) } else { (start, end) };

    let mut months = (i64::from(hi.year()) - i64::from(lo.year())) * 12
        + i64::from(hi.month())
        - i64::from(lo.month());
    let mut anchor = add_months(lo, months)?;
    if anchor > hi {
        months -= 1;
        anchor = add_months(lo, months)?;
    }

    let rest = (hi - anchor).num_seconds();
    let sign = if negative { -1 } else { 1 };

    Ok(Interval {
        months: sign * months,
        days: sign * (rest / 86_400),
        hours: sign * (rest % 86_400 / 3600),
        minutes: sign * (rest % 3600 / 60),
        seconds: sign * (rest % 60),
        total_seconds: (end - start).num_seconds(),
    })
}

fn add_months(dt: NaiveDateTime, months: i64) -> Result<NaiveDateTime> {
    Ok(shift_months(dt.date(), 0, months)?.and_time(dt.time()))
}

// ── Tests ───────────────────────────────────────────────────────────────────
