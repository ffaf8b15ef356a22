//! Timezones and the default-timezone context.
//!
//! A [`Zone`] is either a fixed UTC offset or a named IANA zone whose offset
//! depends on the wall-clock time it is applied to. The process-wide
//! "default timezone" is never read implicitly: every operation that needs
//! it takes a [`TimezoneContext`], which callers build once (usually with
//! [`TimezoneContext::from_env`]) and pass around by reference.

use std::env;
use std::fmt;

use chrono::{FixedOffset, LocalResult, NaiveDateTime, Offset, TimeZone};
use chrono_tz::Tz;
use tracing::debug;

use crate::error::{AlmanacError, Result};

/// Environment variable consulted first by [`TimezoneContext::from_env`].
pub const TIMEZONE_ENV: &str = "ALMANAC_TIMEZONE";

// ── Zone ────────────────────────────────────────────────────────────────────

/// The timezone attached to a [`DateTimeValue`](crate::DateTimeValue).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// A constant offset from UTC (e.g. `+02:00`).
    Fixed(FixedOffset),
    /// An IANA zone (e.g. `Europe/Berlin`), resolved per wall-clock time.
    Named(Tz),
}

impl Zone {
    /// The `UTC` zone.
    pub fn utc() -> Self {
        Zone::Named(Tz::UTC)
    }

    /// A fixed zone `minutes` east of UTC.
    ///
    /// # Errors
    ///
    /// Returns [`AlmanacError::InvalidTimezone`] if the offset is a day or more.
    pub fn fixed_minutes(minutes: i32) -> Result<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(Zone::Fixed)
            .ok_or_else(|| AlmanacError::InvalidTimezone(format!("offset of {minutes} minutes")))
    }

    /// Parse a zone: `Z`, an offset (`+02:00`, `-0530`, `+09`) or an IANA name.
    ///
    /// # Errors
    ///
    /// Returns [`AlmanacError::InvalidTimezone`] for anything else.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("z") {
            return Ok(Zone::utc());
        }
        if s.starts_with('+') || s.starts_with('-') {
            return parse_offset(s).map(Zone::Fixed);
        }
        s.parse::<Tz>()
            .map(Zone::Named)
            .map_err(|_| AlmanacError::InvalidTimezone(format!("'{s}'")))
    }

    /// The IANA name, or the formatted offset for fixed zones.
    pub fn name(&self) -> String {
        match self {
            Zone::Fixed(offset) => format_utc_offset(offset.local_minus_utc()),
            Zone::Named(tz) => tz.name().to_string(),
        }
    }

    /// The offset in force at the given UTC instant.
    pub fn offset_at_utc(&self, utc: &NaiveDateTime) -> FixedOffset {
        match self {
            Zone::Fixed(offset) => *offset,
            Zone::Named(tz) => tz.offset_from_utc_datetime(utc).fix(),
        }
    }

    /// Attach this zone to a wall-clock time.
    ///
    /// Returns the (possibly adjusted) wall-clock time and its offset. A time
    /// inside a DST gap moves forward by the length of the gap; a time inside
    /// a fold takes the earlier of its two offsets.
    pub fn localize(&self, local: NaiveDateTime) -> (NaiveDateTime, FixedOffset) {
        let tz = match self {
            Zone::Fixed(offset) => return (local, *offset),
            Zone::Named(tz) => tz,
        };

        match tz.offset_from_local_datetime(&local) {
            LocalResult::Single(offset) => (local, offset.fix()),
            LocalResult::Ambiguous(earliest, _) => (local, earliest.fix()),
            LocalResult::None => {
                // Read the wall clock with the offset in force before the gap.
                let day_before = local
                    .checked_sub_signed(chrono::Duration::days(1))
                    .unwrap_or(local);
                let before = tz.offset_from_utc_datetime(&day_before).fix();
                let utc = local - chrono::Duration::seconds(i64::from(before.local_minus_utc()));
                let after = tz.offset_from_utc_datetime(&utc).fix();
                let shifted = utc + chrono::Duration::seconds(i64::from(after.local_minus_utc()));
                debug!(zone = tz.name(), %local, %shifted, "wall-clock time falls in a DST gap");
                (shifted, after)
            }
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

// ── TimezoneContext ─────────────────────────────────────────────────────────

/// The default timezone, passed explicitly to operations that need one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimezoneContext {
    default_zone: Zone,
}

impl Default for TimezoneContext {
    fn default() -> Self {
        Self::utc()
    }
}

impl TimezoneContext {
    pub fn new(default_zone: Zone) -> Self {
        Self { default_zone }
    }

    /// A context whose default zone is UTC.
    pub fn utc() -> Self {
        Self::new(Zone::utc())
    }

    /// A context whose default zone is parsed with [`Zone::parse`].
    pub fn named(name: &str) -> Result<Self> {
        Zone::parse(name).map(Self::new)
    }

    /// Build a context from `ALMANAC_TIMEZONE`, falling back to `TZ`.
    ///
    /// When neither variable is set the default zone is UTC.
    ///
    /// # Errors
    ///
    /// Returns [`AlmanacError::InvalidTimezone`] if a variable is set to
    /// something that is not a zone.
    pub fn from_env() -> Result<Self> {
        let raw = [TIMEZONE_ENV, "TZ"]
            .iter()
            .find_map(|key| env::var(key).ok().filter(|v| !v.trim().is_empty()));

        match raw {
            Some(raw) => {
                let name = normalize_tz_env(&raw);
                debug!(timezone = name, "default timezone loaded from environment");
                Self::named(name)
            }
            None => {
                debug!("no timezone in environment, defaulting to UTC");
                Ok(Self::utc())
            }
        }
    }

    pub fn default_zone(&self) -> Zone {
        self.default_zone
    }

    /// The default zone's offset at the given UTC instant.
    pub fn default_offset_at(&self, utc: &NaiveDateTime) -> FixedOffset {
        self.default_zone.offset_at_utc(utc)
    }
}

/// Compare a zone name against the context's default zone.
///
/// Returns `Ok(true)` on a match. On a mismatch (an unknown name counts as
/// one) this returns `Ok(false)`, or [`AlmanacError::ConfigMismatch`] when
/// `throw_on_mismatch` is set.
///
/// # Examples
///
/// ```
/// use almanac::{check_timezone_default, TimezoneContext};
///
/// let ctx = TimezoneContext::named("Europe/Berlin").unwrap();
/// assert!(check_timezone_default(&ctx, "Europe/Berlin", true).unwrap());
/// assert!(!check_timezone_default(&ctx, "UTC", false).unwrap());
/// assert!(check_timezone_default(&ctx, "UTC", true).is_err());
/// ```
pub fn check_timezone_default(
    ctx: &TimezoneContext,
    name: &str,
    throw_on_mismatch: bool,
) -> Result<bool> {
    let matches = Zone::parse(name).is_ok_and(|zone| zone == ctx.default_zone());

    if !matches && throw_on_mismatch {
        return Err(AlmanacError::ConfigMismatch {
            expected: name.to_string(),
            actual: ctx.default_zone().name(),
        });
    }
    Ok(matches)
}

// ── Internal helpers ────────────────────────────────────────────────────────

/// Parse `±HH:MM`, `±HHMM` or `±HH` into a fixed offset.
pub(crate) fn parse_offset(s: &str) -> Result<FixedOffset> {
    let invalid = || AlmanacError::InvalidTimezone(format!("malformed offset '{s}'"));

    let (sign, rest) = match s.as_bytes().first() {
        Some(b'+') => (1, &s[1..]),
        Some(b'-') => (-1, &s[1..]),
        _ => return Err(invalid()),
    };
    if !rest.is_ascii() {
        return Err(invalid());
    }

    let (hh, mm) = match rest.len() {
        2 => (rest, "00"),
        4 => (&rest[..2], &rest[2..]),
        5 if rest.as_bytes()[2] == b':' => (&rest[..2], &rest[3..]),
        _ => return Err(invalid()),
    };
    if !hh.bytes().chain(mm.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let hours: i32 = hh.parse().map_err(|_| invalid())?;
    let minutes: i32 = mm.parse().map_err(|_| invalid())?;
    if minutes >= 60 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// Format an offset in seconds as `+HH:MM` / `-HH:MM`.
pub(crate) fn format_utc_offset(offset_secs: i32) -> String {
    let sign = if offset_secs >= 0 { "+" } else { "-" };
    let abs_secs = offset_secs.unsigned_abs();
    let hours = abs_secs / 3600;
    let minutes = (abs_secs % 3600) / 60;
    format!("{sign}{hours:02}:{minutes:02}")
}

/// Strip the `:` prefix and zoneinfo paths that `TZ` values often carry.
fn normalize_tz_env(raw: &str) -> &str {
    let s = raw.trim();
    let s = s.strip_prefix(':').unwrap_or(s);
    match s.find("zoneinfo/") {
        Some(idx) => &s[idx + "zoneinfo/".len()..],
        None => s,
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
