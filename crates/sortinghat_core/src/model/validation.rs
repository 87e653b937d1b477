//! Validation errors shared by registry domain records.

use chrono::NaiveDateTime;
use std::error::Error;
use std::fmt::{Display, Formatter};

use super::enrollment::PERIOD_FORMAT;

/// Rejection reasons for registry records and command inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Unique identity key is empty after trimming.
    EmptyUuid,
    /// Identity source is empty after trimming.
    EmptySource,
    /// Identity has no email, name or username.
    MissingIdentityData,
    /// Organization name is empty after trimming.
    EmptyOrganizationName,
    /// Enrollment end is earlier than its start.
    InvalidPeriod {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    /// Enrollment bound falls outside the representable period range.
    PeriodOutOfRange(NaiveDateTime),
    /// Date text is neither `YYYY-MM-DD` nor `YYYY-MM-DD HH:MM:SS`.
    InvalidDate(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUuid => write!(f, "unique identity uuid cannot be empty"),
            Self::EmptySource => write!(f, "identity source cannot be empty"),
            Self::MissingIdentityData => write!(
                f,
                "identity data cannot be empty; provide an email, a name or a username"
            ),
            Self::EmptyOrganizationName => write!(f, "organization name cannot be empty"),
            Self::InvalidPeriod { start, end } => write!(
                f,
                "start date {} cannot be greater than end date {}",
                start.format(PERIOD_FORMAT),
                end.format(PERIOD_FORMAT)
            ),
            Self::PeriodOutOfRange(value) => write!(
                f,
                "date {} is out of bounds",
                value.format(PERIOD_FORMAT)
            ),
            Self::InvalidDate(value) => write!(f, "invalid date `{value}`"),
        }
    }
}

impl Error for ValidationError {}
