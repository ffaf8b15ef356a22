//! Resolving external date-time representations into [`DateTimeValue`]s.
//!
//! [`resolve`] accepts epoch seconds, ISO 8601-like strings, existing values
//! and `chrono` date-times, and returns a value in the context's default
//! zone (all fields recomputed), or in the source's own zone when the caller
//! asks to keep it.
//!
//! # Accepted strings
//!
//! - `YYYY-MM-DD` (midnight)
//! - `YYYY-MM-DDTHH:MM[:SS[.fraction]]`, with `T` or a space as separator
//! - any of the above followed by `Z`, `±HH:MM`, `±HHMM` or `±HH`
//! - `±HH:MM` written with a space instead of `+` (`10:14:47 02:00`), which
//!   is what a `+` becomes after form-urlencoded decoding
//! - `@<seconds>` for epoch seconds
//!
//! Fractions of a second are truncated. Anything else is an
//! [`AlmanacError::InvalidDatetime`]; there is no fallback to "now".

use std::borrow::Cow;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::error::{AlmanacError, Result};
use crate::value::DateTimeValue;
use crate::zone::{parse_offset, TimezoneContext, Zone};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Anything [`resolve`] can turn into a [`DateTimeValue`].
#[derive(Debug, Clone)]
pub enum Input<'a> {
    /// Seconds since 1970-01-01T00:00:00Z.
    Epoch(i64),
    /// A date-time string (see the module docs for accepted forms).
    Text(&'a str),
    /// An existing value.
    Value(DateTimeValue),
    /// A `chrono` date-time with a fixed offset.
    Fixed(DateTime<FixedOffset>),
    /// A `chrono` date-time in an IANA zone.
    Zoned(DateTime<Tz>),
}

impl From<i64> for Input<'_> {
    fn from(seconds: i64) -> Self {
        Input::Epoch(seconds)
    }
}

impl<'a> From<&'a str> for Input<'a> {
    fn from(text: &'a str) -> Self {
        Input::Text(text)
    }
}

impl<'a> From<&'a String> for Input<'a> {
    fn from(text: &'a String) -> Self {
        Input::Text(text.as_str())
    }
}

impl From<DateTimeValue> for Input<'_> {
    fn from(value: DateTimeValue) -> Self {
        Input::Value(value)
    }
}

impl From<&DateTimeValue> for Input<'_> {
    fn from(value: &DateTimeValue) -> Self {
        Input::Value(value.clone())
    }
}

impl From<DateTime<FixedOffset>> for Input<'_> {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Input::Fixed(dt)
    }
}

impl From<DateTime<Utc>> for Input<'_> {
    fn from(dt: DateTime<Utc>) -> Self {
        Input::Fixed(dt.fixed_offset())
    }
}

impl From<DateTime<Tz>> for Input<'_> {
    fn from(dt: DateTime<Tz>) -> Self {
        Input::Zoned(dt)
    }
}

/// Resolve `input` into a value.
///
/// With `keep_foreign_timezone` unset the result is expressed in the
/// context's default zone. With it set, the source's zone is kept: UTC for
/// epoch seconds, the written offset for strings that carry one, the
/// default zone for strings that do not.
///
/// # Errors
///
/// Returns [`AlmanacError::InvalidDatetime`] if a string cannot be parsed,
/// or [`AlmanacError::OutOfRange`] for epoch seconds outside the calendar.
///
/// # Examples
///
/// ```
/// use almanac::{resolve, TimezoneContext};
///
/// let ctx = TimezoneContext::utc();
/// let value = resolve("2019-04-05T10:14:47 02:00", &ctx, true).unwrap();
/// assert_eq!(value.to_iso8601(), "2019-04-05T10:14:47+02:00");
///
/// let value = resolve(-1, &ctx, false).unwrap();
/// assert_eq!(value.to_iso8601(), "1969-12-31T23:59:59Z");
/// ```
pub fn resolve<'a>(
    input: impl Into<Input<'a>>,
    ctx: &TimezoneContext,
    keep_foreign_timezone: bool,
) -> Result<DateTimeValue> {
    let source = match input.into() {
        Input::Epoch(seconds) => DateTimeValue::from_epoch(seconds, Zone::utc())?,
        Input::Text(text) => parse_text(text, ctx)?,
        Input::Value(value) => value,
        Input::Fixed(dt) => {
            DateTimeValue::from_epoch(dt.timestamp(), Zone::Fixed(*dt.offset()))?
        }
        Input::Zoned(dt) => {
            DateTimeValue::from_epoch(dt.timestamp(), Zone::Named(dt.timezone()))?
        }
    };

    if keep_foreign_timezone || source.zone() == ctx.default_zone() {
        return Ok(source);
    }
    Ok(source.to_zone(ctx.default_zone()))
}

// ── String parsing ──────────────────────────────────────────────────────────

fn parse_text(text: &str, ctx: &TimezoneContext) -> Result<DateTimeValue> {
    let invalid = || AlmanacError::InvalidDatetime(format!("'{text}'"));

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AlmanacError::InvalidDatetime("empty input".to_string()));
    }

    if let Some(seconds) = trimmed.strip_prefix('@') {
        let seconds: i64 = seconds.parse().map_err(|_| invalid())?;
        return DateTimeValue::from_epoch(seconds, Zone::utc());
    }

    let repaired = repair_offset_sign(trimmed);
    let (body, zone) = split_offset(&repaired).map_err(|_| invalid())?;
    let local = parse_naive(body).ok_or_else(invalid)?;

    DateTimeValue::from_local(local, zone.unwrap_or(ctx.default_zone()))
}

/// Put back a `+` that URL decoding turned into a space before `HH:MM`.
///
/// Only applies when the text before the space already has a time in it, so
/// `2019-04-05 10:14` (date, space, time) is left alone.
fn repair_offset_sign(s: &str) -> Cow<'_, str> {
    if let Some(idx) = s.rfind(' ') {
        let (head, tail) = (&s[..idx], &s[idx + 1..]);
        if is_hh_mm(tail) && head.contains(':') {
            debug!(input = s, "restoring '+' in front of offset");
            return Cow::Owned(format!("{head}+{tail}"));
        }
    }
    Cow::Borrowed(s)
}

fn is_hh_mm(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 5
        && b[2] == b':'
        && [b[0], b[1], b[3], b[4]].iter().all(|c| c.is_ascii_digit())
}

/// Split a trailing `Z` or numeric offset off the time part of a string.
fn split_offset(s: &str) -> Result<(&str, Option<Zone>)> {
    if let Some(body) = s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
        return Ok((body, Some(Zone::utc())));
    }

    // Only look for a sign after the date, whose dashes are not offsets.
    let Some(time_start) = s.find(['T', ' ']) else {
        return Ok((s, None));
    };
    match s[time_start..].rfind(['+', '-']) {
        Some(pos) => {
            let (body, offset) = s.split_at(time_start + pos);
            Ok((body.trim_end(), Some(Zone::Fixed(parse_offset(offset)?))))
        }
        None => Ok((s, None)),
    }
}

/// Parse the wall-clock part, dropping any fraction of a second.
///
/// Leap seconds (`:60`) are rejected; values have no room for them.
fn parse_naive(body: &str) -> Option<NaiveDateTime> {
    let body = strip_fraction(body);

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(body, fmt).ok())
        .filter(|dt| dt.nanosecond() < 1_000_000_000)
        .or_else(|| {
            NaiveDate::parse_from_str(body, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

fn strip_fraction(body: &str) -> &str {
    match body.rfind('.') {
        Some(dot)
            if body[..dot].contains(':')
                && body.len() > dot + 1
                && body[dot + 1..].bytes().all(|b| b.is_ascii_digit()) =>
        {
            &body[..dot]
        }
        _ => body,
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
