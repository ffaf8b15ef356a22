//! The calendar date-time value.
//!
//! A [`DateTimeValue`] is a wall-clock date and time (second precision) in
//! the proleptic Gregorian calendar, together with the [`Zone`] it belongs
//! to and the UTC offset that zone has at that wall-clock time. The day is
//! always valid for its month: every constructor and every operation goes
//! through `chrono::NaiveDate`, so a value such as 2018-02-30 cannot exist.
//!
//! Values are plain owned data. Arithmetic (see [`crate::arithmetic`])
//! mutates in place; take a `clone()` first when the original is needed.

use std::fmt;

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound, TimeZone,
    Timelike, Utc,
};
use serde::{Serialize, Serializer};

use crate::error::{AlmanacError, Result};
use crate::zone::{format_utc_offset, TimezoneContext, Zone};

/// A wall-clock date-time with an attached timezone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimeValue {
    local: NaiveDateTime,
    offset: FixedOffset,
    zone: Zone,
}

/// Every output form of a value at once, for serialization.
#[derive(Debug, Clone, Serialize)]
pub struct Rendering {
    /// ISO 8601 with `Z` or `±HH:MM`.
    pub iso8601: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    /// `YYYY-MM-DD HH:MM:SS` wall-clock time.
    pub local: String,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    /// The zone name (IANA name or fixed offset).
    pub timezone: String,
    /// The UTC offset at this value (e.g. `"-05:00"`).
    pub utc_offset: String,
}

impl DateTimeValue {
    // ── Construction ────────────────────────────────────────────────────

    /// The current instant in the context's default zone.
    pub fn now(ctx: &TimezoneContext) -> Self {
        Self::from_instant(&Utc::now(), ctx.default_zone())
    }

    /// The given instant, expressed in `zone`. Sub-second precision is dropped.
    pub fn from_instant<T: TimeZone>(instant: &DateTime<T>, zone: Zone) -> Self {
        let utc = instant.with_timezone(&Utc).trunc_subsecs(0);
        let offset = zone.offset_at_utc(&utc.naive_utc());
        Self {
            local: utc.with_timezone(&offset).naive_local(),
            offset,
            zone,
        }
    }

    /// Seconds since 1970-01-01T00:00:00Z, expressed in `zone`.
    ///
    /// # Errors
    ///
    /// Returns [`AlmanacError::OutOfRange`] if the instant cannot be represented.
    pub fn from_epoch(seconds: i64, zone: Zone) -> Result<Self> {
        let instant = DateTime::from_timestamp(seconds, 0)
            .ok_or_else(|| AlmanacError::OutOfRange(format!("epoch seconds {seconds}")))?;
        checked_local(instant.naive_utc())?;
        Ok(Self::from_instant(&instant, zone))
    }

    /// A value from explicit calendar fields.
    ///
    /// # Errors
    ///
    /// Returns [`AlmanacError::InvalidDate`] if the fields do not name a real
    /// date and time (month 13, February 30, hour 24, ...).
    ///
    /// # Examples
    ///
    /// ```
    /// use almanac::{DateTimeValue, Zone};
    ///
    /// let value = DateTimeValue::from_fields(2018, 1, 1, 15, 37, 13, Zone::utc()).unwrap();
    /// assert_eq!(value.to_local_string(), "2018-01-01 15:37:13");
    /// assert!(DateTimeValue::from_fields(2018, 2, 30, 0, 0, 0, Zone::utc()).is_err());
    /// ```
    pub fn from_fields(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
        zone: Zone,
    ) -> Result<Self> {
        let date = checked_date(year, month, day)?;
        let time = checked_time(hour, minute, second)?;
        Self::from_local(date.and_time(time), zone)
    }

    /// Attach `zone` to a wall-clock time, re-resolving DST gaps and folds.
    pub(crate) fn from_local(local: NaiveDateTime, zone: Zone) -> Result<Self> {
        let (local, offset) = zone.localize(checked_local(local)?);
        Ok(Self {
            local,
            offset,
            zone,
        })
    }

    // ── Setters ─────────────────────────────────────────────────────────

    /// Replace the date, keeping the time of day and zone.
    pub fn set_date(&mut self, year: i32, month: u32, day: u32) -> Result<&mut Self> {
        let date = checked_date(year, month, day)?;
        self.set_local(date.and_time(self.local.time()))?;
        Ok(self)
    }

    /// Replace the time of day, keeping the date and zone.
    pub fn set_time(&mut self, hour: u32, minute: u32, second: u32) -> Result<&mut Self> {
        let time = checked_time(hour, minute, second)?;
        self.set_local(self.local.date().and_time(time))?;
        Ok(self)
    }

    /// Move to another instant, keeping the zone.
    pub fn set_timestamp(&mut self, seconds: i64) -> Result<&mut Self> {
        *self = Self::from_epoch(seconds, self.zone)?;
        Ok(self)
    }

    /// Re-express the same instant in another zone. All fields are recomputed.
    pub fn set_timezone(&mut self, zone: Zone) -> &mut Self {
        *self = self.to_zone(zone);
        self
    }

    /// A copy of this instant expressed in `zone`.
    pub fn to_zone(&self, zone: Zone) -> Self {
        Self::from_instant(&self.to_fixed(), zone)
    }

    /// Replace the wall-clock time, re-resolving the zone's offset.
    pub(crate) fn set_local(&mut self, local: NaiveDateTime) -> Result<()> {
        let (local, offset) = self.zone.localize(checked_local(local)?);
        self.local = local;
        self.offset = offset;
        Ok(())
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn year(&self) -> i32 {
        self.local.year()
    }

    pub fn month(&self) -> u32 {
        self.local.month()
    }

    pub fn day(&self) -> u32 {
        self.local.day()
    }

    pub fn hour(&self) -> u32 {
        self.local.hour()
    }

    pub fn minute(&self) -> u32 {
        self.local.minute()
    }

    pub fn second(&self) -> u32 {
        self.local.second()
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Minutes east of UTC.
    pub fn offset_minutes(&self) -> i32 {
        self.offset.local_minus_utc() / 60
    }

    /// Whether the value sits at a zero UTC offset.
    pub fn is_utc(&self) -> bool {
        self.offset.local_minus_utc() == 0
    }

    pub fn naive_local(&self) -> NaiveDateTime {
        self.local
    }

    pub fn date(&self) -> NaiveDate {
        self.local.date()
    }

    /// Seconds since the Unix epoch.
    pub fn timestamp(&self) -> i64 {
        self.to_fixed().timestamp()
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.to_fixed().with_timezone(&Utc)
    }

    pub fn to_fixed(&self) -> DateTime<FixedOffset> {
        let utc = self.local - chrono::Duration::seconds(i64::from(self.offset.local_minus_utc()));
        DateTime::from_naive_utc_and_offset(utc, self.offset)
    }

    /// The same date at 00:00:00 in the same zone.
    pub fn start_of_day(&self) -> Self {
        let (local, offset) = self.zone.localize(self.local.date().and_time(NaiveTime::MIN));
        Self {
            local,
            offset,
            zone: self.zone,
        }
    }

    // ── Output formats ──────────────────────────────────────────────────

    /// `YYYY-MM-DD`.
    pub fn to_date_string(&self) -> String {
        self.local.format("%Y-%m-%d").to_string()
    }

    /// `YYYY-MM-DD HH:MM:SS`.
    pub fn to_local_string(&self) -> String {
        self.local.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    /// ISO 8601 with `Z` for a zero offset, `±HH:MM` otherwise.
    pub fn to_iso8601(&self) -> String {
        let offset = match self.offset.local_minus_utc() {
            0 => "Z".to_string(),
            secs => format_utc_offset(secs),
        };
        format!("{}{offset}", self.local.format("%Y-%m-%dT%H:%M:%S"))
    }

    pub fn summary(&self) -> Rendering {
        Rendering {
            iso8601: self.to_iso8601(),
            date: self.to_date_string(),
            local: self.to_local_string(),
            timestamp: self.timestamp(),
            timezone: self.zone.name(),
            utc_offset: format_utc_offset(self.offset.local_minus_utc()),
        }
    }
}

impl fmt::Display for DateTimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl Serialize for DateTimeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ── Internal helpers ────────────────────────────────────────────────────────

fn checked_date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| AlmanacError::InvalidDate(format!("{year:04}-{month:02}-{day:02}")))
}

fn checked_time(hour: u32, minute: u32, second: u32) -> Result<NaiveTime> {
    NaiveTime::from_hms_opt(hour, minute, second)
        .ok_or_else(|| AlmanacError::InvalidDate(format!("{hour:02}:{minute:02}:{second:02}")))
}

/// Keep a day of headroom at both ends of chrono's range so offset
/// conversions can never overflow.
pub(crate) fn checked_local(local: NaiveDateTime) -> Result<NaiveDateTime> {
    let headroom = chrono::Duration::days(1);
    match (
        local.checked_sub_signed(headroom),
        local.checked_add_signed(headroom),
    ) {
        (Some(_), Some(_)) => Ok(local),
        _ => Err(AlmanacError::OutOfRange(format!(
            "{} is outside the supported calendar range",
            local.format("%Y-%m-%d")
        ))),
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn berlin() -> Zone {
        Zone::parse("Europe/Berlin").unwrap()
    }

    // ── construction tests ──────────────────────────────────────────────

    #[test]
    fn test_from_fields_exposes_fields() {
        let v = DateTimeValue::from_fields(2018, 1, 31, 23, 59, 58, Zone::utc()).unwrap();
        assert_eq!(
            (v.year(), v.month(), v.day(), v.hour(), v.minute(), v.second()),
            (2018, 1, 31, 23, 59, 58)
        );
        assert_eq!(v.offset_minutes(), 0);
        assert!(v.is_utc());
    }

    #[test]
    fn test_from_fields_rejects_invalid_day() {
        let err = DateTimeValue::from_fields(2018, 2, 30, 0, 0, 0, Zone::utc()).unwrap_err();
        assert_eq!(err, AlmanacError::InvalidDate("2018-02-30".to_string()));
    }

    #[test]
    fn test_from_fields_rejects_invalid_time() {
        let err = DateTimeValue::from_fields(2018, 2, 1, 24, 0, 0, Zone::utc()).unwrap_err();
        assert!(matches!(err, AlmanacError::InvalidDate(_)));
    }

    #[test]
    fn test_from_fields_named_zone_resolves_offset() {
        let v = DateTimeValue::from_fields(2019, 7, 1, 12, 0, 0, berlin()).unwrap();
        assert_eq!(v.offset_minutes(), 120);
        assert_eq!(v.to_iso8601(), "2019-07-01T12:00:00+02:00");
    }

    #[test]
    fn test_from_epoch_zero_and_negative() {
        let zero = DateTimeValue::from_epoch(0, Zone::utc()).unwrap();
        assert_eq!(zero.to_iso8601(), "1970-01-01T00:00:00Z");

        let before = DateTimeValue::from_epoch(-1, Zone::utc()).unwrap();
        assert_eq!(before.to_iso8601(), "1969-12-31T23:59:59Z");
        assert_eq!(before.timestamp(), -1);
    }

    #[test]
    fn test_from_epoch_in_named_zone() {
        let v = DateTimeValue::from_epoch(0, berlin()).unwrap();
        assert_eq!(v.to_iso8601(), "1970-01-01T01:00:00+01:00");
        assert_eq!(v.timestamp(), 0);
    }

    #[test]
    fn test_from_epoch_out_of_range() {
        let err = DateTimeValue::from_epoch(i64::MAX, Zone::utc()).unwrap_err();
        assert!(matches!(err, AlmanacError::OutOfRange(_)));
    }

    #[test]
    fn test_from_epoch_out_of_range_east_of_utc() {
        let last = NaiveDateTime::MAX.and_utc().timestamp();
        let err = DateTimeValue::from_epoch(last, Zone::parse("Asia/Tokyo").unwrap()).unwrap_err();
        assert!(matches!(err, AlmanacError::OutOfRange(_)));

        let first = NaiveDateTime::MIN.and_utc().timestamp();
        let err = DateTimeValue::from_epoch(first, Zone::parse("-05:00").unwrap()).unwrap_err();
        assert!(matches!(err, AlmanacError::OutOfRange(_)));
    }

    #[test]
    fn test_set_timestamp_out_of_range_leaves_value() {
        let zone = Zone::parse("+14:00").unwrap();
        let mut v = DateTimeValue::from_fields(2019, 4, 5, 10, 14, 47, zone).unwrap();
        let before = v.clone();
        let last = NaiveDateTime::MAX.and_utc().timestamp();
        assert!(v.set_timestamp(last).is_err());
        assert_eq!(v, before);
    }

    #[test]
    fn test_now_uses_context_zone() {
        let ctx = TimezoneContext::named("Asia/Tokyo").unwrap();
        let v = DateTimeValue::now(&ctx);
        assert_eq!(v.zone().name(), "Asia/Tokyo");
        assert_eq!(v.offset_minutes(), 9 * 60);
    }

    // ── setter tests ────────────────────────────────────────────────────

    #[test]
    fn test_set_date_and_time() {
        let mut v = DateTimeValue::from_epoch(0, Zone::utc()).unwrap();
        v.set_date(2020, 2, 29).unwrap().set_time(8, 30, 5).unwrap();
        assert_eq!(v.to_local_string(), "2020-02-29 08:30:05");
    }

    #[test]
    fn test_set_date_invalid_leaves_value_untouched() {
        let mut v = DateTimeValue::from_fields(2019, 3, 1, 0, 0, 0, Zone::utc()).unwrap();
        assert!(v.set_date(2019, 2, 29).is_err());
        assert_eq!(v.to_date_string(), "2019-03-01");
    }

    #[test]
    fn test_set_timestamp_keeps_zone() {
        let mut v = DateTimeValue::from_fields(2019, 1, 1, 0, 0, 0, berlin()).unwrap();
        v.set_timestamp(86_400).unwrap();
        assert_eq!(v.to_iso8601(), "1970-01-02T01:00:00+01:00");
    }

    #[test]
    fn test_set_timezone_recomputes_fields() {
        let mut v = DateTimeValue::from_fields(2019, 4, 5, 10, 14, 47, Zone::parse("+02:00").unwrap())
            .unwrap();
        let instant = v.timestamp();
        v.set_timezone(Zone::utc());
        assert_eq!(v.to_iso8601(), "2019-04-05T08:14:47Z");
        assert_eq!(v.timestamp(), instant);
    }

    #[test]
    fn test_to_zone_across_date_line() {
        let v = DateTimeValue::from_fields(2019, 12, 31, 20, 0, 0, Zone::utc()).unwrap();
        let tokyo = v.to_zone(Zone::parse("Asia/Tokyo").unwrap());
        assert_eq!(tokyo.to_local_string(), "2020-01-01 05:00:00");
        assert_eq!(tokyo.instant(), v.instant());
    }

    #[test]
    fn test_start_of_day() {
        let v = DateTimeValue::from_fields(2019, 2, 1, 17, 45, 12, berlin()).unwrap();
        let start = v.start_of_day();
        assert_eq!(start.to_iso8601(), "2019-02-01T00:00:00+01:00");
    }

    // ── output format tests ─────────────────────────────────────────────

    #[test]
    fn test_output_formats() {
        let v = DateTimeValue::from_fields(2019, 4, 5, 10, 14, 47, Zone::parse("-03:30").unwrap())
            .unwrap();
        assert_eq!(v.to_date_string(), "2019-04-05");
        assert_eq!(v.to_local_string(), "2019-04-05 10:14:47");
        assert_eq!(v.to_iso8601(), "2019-04-05T10:14:47-03:30");
        assert_eq!(v.to_string(), v.to_iso8601());
    }

    #[test]
    fn test_serialize_as_iso_string() {
        let v = DateTimeValue::from_epoch(0, Zone::utc()).unwrap();
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "\"1970-01-01T00:00:00Z\"");
    }

    #[test]
    fn test_summary() {
        let v = DateTimeValue::from_fields(2019, 1, 15, 9, 0, 0, berlin()).unwrap();
        let summary = v.summary();
        assert_eq!(summary.iso8601, "2019-01-15T09:00:00+01:00");
        assert_eq!(summary.date, "2019-01-15");
        assert_eq!(summary.local, "2019-01-15 09:00:00");
        assert_eq!(summary.timezone, "Europe/Berlin");
        assert_eq!(summary.utc_offset, "+01:00");
        assert_eq!(summary.timestamp, v.timestamp());
    }
}
