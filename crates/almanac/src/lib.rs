//! # almanac
//!
//! Calendar-aware date/time values for the proleptic Gregorian calendar.
//!
//! A [`DateTimeValue`] is a wall-clock date and time (second precision) with
//! an attached [`Zone`]. It supports month arithmetic with day clamping,
//! time arithmetic with floored carry into the date, lenient resolving of
//! external inputs, and month-accurate differences that do not depend on the
//! process's default timezone.
//!
//! The default timezone is never read implicitly. Operations that need it
//! take a [`TimezoneContext`], built once by the caller.
//!
//! ## Modules
//!
//! - [`value`] — the value type, constructors, setters and output formats
//! - [`arithmetic`] — `modify_date` / `modify_time` and calendar helpers
//! - [`resolve`] — epoch seconds, strings and foreign date-times → values
//! - [`diff`] — timezone-normalized month/day/time differences
//! - [`zone`] — zones, the default-timezone context, default-zone checks
//! - [`error`] — Error types
//!
//! ```
//! use almanac::{resolve, TimezoneContext};
//!
//! let ctx = TimezoneContext::utc();
//! let mut value = resolve("2018-01-31", &ctx, false).unwrap();
//! value.modify_date(0, 25, 0).unwrap();
//! assert_eq!(value.to_date_string(), "2020-02-29");
//! ```

pub mod arithmetic;
pub mod diff;
pub mod error;
pub mod resolve;
pub mod value;
pub mod zone;

pub use arithmetic::{days_in_month, is_leap_year};
pub use diff::Interval;
pub use error::{AlmanacError, Result};
pub use resolve::{resolve, Input};
pub use value::{DateTimeValue, Rendering};
pub use zone::{check_timezone_default, TimezoneContext, Zone, TIMEZONE_ENV};
