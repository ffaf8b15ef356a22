//! Error types for almanac operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlmanacError {
    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Timezone mismatch: {left} vs {right}")]
    TimezoneMismatch { left: String, right: String },

    #[error("Timezone configuration mismatch: expected '{expected}', default is '{actual}'")]
    ConfigMismatch { expected: String, actual: String },

    #[error("Out of range: {0}")]
    OutOfRange(String),
}

pub type Result<T> = std::result::Result<T, AlmanacError>;
