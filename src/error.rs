//! Error types for the rota engine.
//!
//! Only input problems are errors. A day that cannot satisfy every hard rule
//! because of locked cells is committed anyway and reported through
//! [`crate::validation::day_violations`].

use chrono::NaiveDate;
use thiserror::Error;

use crate::validation::ValidationError;

/// Errors raised before any schedule mutation takes place.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("invalid date '{input}': {source}")]
    InvalidDate {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("unknown member: {0}")]
    UnknownMember(String),

    #[error("member '{0}' is not a leader and cannot hold the key")]
    NotKeyEligible(String),

    #[error("date {date} is outside the scheduled range {start}..={end}")]
    DateOutOfRange {
        date: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("schedule has no entry for {0}")]
    MissingDay(NaiveDate),

    #[error("day {date} has no assignment for member '{member}'")]
    IncompleteDay { date: NaiveDate, member: String },

    #[error("invalid roster: {}", join_errors(.0))]
    InvalidRoster(Vec<ValidationError>),

    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ScheduleError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_range_error_message() {
        let err = ScheduleError::InvalidRange {
            start: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            end: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "start date 2026-03-10 is after end date 2026-03-01"
        );
    }

    #[test]
    fn test_roster_error_joins_messages() {
        let err = ScheduleError::InvalidRoster(vec![
            ValidationError::new(ValidationErrorKind::DuplicateId, "Duplicate member ID: A"),
            ValidationError::new(ValidationErrorKind::EmptyRoster, "Roster has no members"),
        ]);
        assert_eq!(
            err.to_string(),
            "invalid roster: Duplicate member ID: A; Roster has no members"
        );
    }
}
