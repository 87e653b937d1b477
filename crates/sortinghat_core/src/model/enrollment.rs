//! Enrollment domain model.
//!
//! # Responsibility
//! - Describe time-bounded affiliations between unique identities and
//!   organizations.
//! - Own period defaults, bounds and the textual date format.
//!
//! # Invariants
//! - `start <= end`.
//! - Both bounds lie within `[period_min(), period_max()]`.
//! - Timestamps have second precision.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use super::validation::ValidationError;

/// Storage and display format for enrollment bounds.
pub const PERIOD_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATE_ONLY_FORMAT: &str = "%Y-%m-%d";

/// Lower bound used when an enrollment start is omitted.
pub fn period_min() -> NaiveDateTime {
    midnight(1900, 1, 1)
}

/// Upper bound used when an enrollment end is omitted.
pub fn period_max() -> NaiveDateTime {
    midnight(2100, 1, 1)
}

/// Parses `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS` text into a period bound.
pub fn parse_period_date(value: &str) -> Result<NaiveDateTime, ValidationError> {
    let trimmed = value.trim();
    if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, PERIOD_FORMAT) {
        return Ok(parsed);
    }
    NaiveDate::parse_from_str(trimmed, DATE_ONLY_FORMAT)
        .map(|date| date.and_time(NaiveTime::MIN))
        .map_err(|_| ValidationError::InvalidDate(trimmed.to_string()))
}

/// Formats a period bound the way it is stored and printed.
pub fn format_period_date(value: &NaiveDateTime) -> String {
    value.format(PERIOD_FORMAT).to_string()
}

fn midnight(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .map(|date| date.and_time(NaiveTime::MIN))
        .unwrap_or(NaiveDateTime::MIN)
}

/// Affiliation of one unique identity with one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    /// Owning unique identity.
    pub uuid: String,
    /// Organization name.
    pub organization: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Enrollment {
    /// Creates a validated enrollment, filling omitted bounds with defaults.
    pub fn new(
        uuid: impl Into<String>,
        organization: impl Into<String>,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Result<Self, ValidationError> {
        let enrollment = Self {
            uuid: uuid.into().trim().to_string(),
            organization: organization.into().trim().to_string(),
            start: truncate_subsec(start.unwrap_or_else(period_min)),
            end: truncate_subsec(end.unwrap_or_else(period_max)),
        };
        enrollment.validate()?;
        Ok(enrollment)
    }

    /// Checks key fields and period invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.uuid.trim().is_empty() {
            return Err(ValidationError::EmptyUuid);
        }
        if self.organization.trim().is_empty() {
            return Err(ValidationError::EmptyOrganizationName);
        }
        validate_period(self.start, self.end)
    }
}

/// Checks that `[start, end]` is ordered and within the supported range.
pub fn validate_period(start: NaiveDateTime, end: NaiveDateTime) -> Result<(), ValidationError> {
    for bound in [start, end] {
        if bound < period_min() || bound > period_max() {
            return Err(ValidationError::PeriodOutOfRange(bound));
        }
    }
    if start > end {
        return Err(ValidationError::InvalidPeriod { start, end });
    }
    Ok(())
}

fn truncate_subsec(value: NaiveDateTime) -> NaiveDateTime {
    value.with_nanosecond(0).unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::{
        format_period_date, parse_period_date, period_max, period_min, Enrollment,
    };
    use crate::model::validation::ValidationError;

    #[test]
    fn omitted_bounds_default_to_full_range() {
        let enrollment = Enrollment::new("abc", "Example", None, None).unwrap();
        assert_eq!(format_period_date(&enrollment.start), "1900-01-01 00:00:00");
        assert_eq!(format_period_date(&enrollment.end), "2100-01-01 00:00:00");
        assert_eq!(enrollment.start, period_min());
        assert_eq!(enrollment.end, period_max());
    }

    #[test]
    fn parse_accepts_date_and_datetime() {
        let date = parse_period_date("1999-01-01").unwrap();
        assert_eq!(format_period_date(&date), "1999-01-01 00:00:00");

        let datetime = parse_period_date(" 2006-03-04 10:11:12 ").unwrap();
        assert_eq!(format_period_date(&datetime), "2006-03-04 10:11:12");

        let err = parse_period_date("01/01/1999").unwrap_err();
        assert_eq!(err, ValidationError::InvalidDate("01/01/1999".to_string()));
    }

    #[test]
    fn reversed_period_is_rejected() {
        let start = parse_period_date("2008-01-01").unwrap();
        let end = parse_period_date("2006-01-01").unwrap();
        let err = Enrollment::new("abc", "Example", Some(start), Some(end)).unwrap_err();
        assert_eq!(err, ValidationError::InvalidPeriod { start, end });
    }

    #[test]
    fn bounds_outside_range_are_rejected() {
        let early = parse_period_date("1899-12-31").unwrap();
        let err = Enrollment::new("abc", "Example", Some(early), None).unwrap_err();
        assert_eq!(err, ValidationError::PeriodOutOfRange(early));
    }

    #[test]
    fn blank_keys_are_rejected() {
        assert_eq!(
            Enrollment::new(" ", "Example", None, None).unwrap_err(),
            ValidationError::EmptyUuid
        );
        assert_eq!(
            Enrollment::new("abc", "", None, None).unwrap_err(),
            ValidationError::EmptyOrganizationName
        );
    }
}
