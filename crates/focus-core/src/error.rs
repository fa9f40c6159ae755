//! Typed errors surfaced by the board core.
//!
//! The command layer wraps these in `anyhow` with context; the core
//! keeps them typed so callers can tell a rejected form from a missing
//! task.

use std::fmt;

use thiserror::Error;

use crate::task::Status;

/// A single constraint a task draft or user entry failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    EmptyTitle,
    EmptyProject,
    EmptyDeadline,
    MalformedDeadline(String),
    DeadlineInPast { deadline: String, today: String },
    NonPositiveMinutes(i64),
    InvalidMinutes(String),
    MissingRepeatInterval,
    UnknownRepeatInterval(String),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::EmptyProject => write!(f, "project must not be empty"),
            Self::EmptyDeadline => write!(f, "deadline must not be empty"),
            Self::MalformedDeadline(raw) => {
                write!(f, "deadline must be a YYYY-MM-DD date, got {raw:?}")
            }
            Self::DeadlineInPast { deadline, today } => {
                write!(f, "deadline {deadline} is before today ({today})")
            }
            Self::NonPositiveMinutes(value) => {
                write!(f, "planned minutes must be greater than 0, got {value}")
            }
            Self::InvalidMinutes(raw) => {
                write!(f, "expected a positive number of minutes, got {raw:?}")
            }
            Self::MissingRepeatInterval => {
                write!(f, "repeating tasks need an interval (daily, weekly, monthly)")
            }
            Self::UnknownRepeatInterval(raw) => {
                write!(f, "unknown repeat interval {raw:?} (daily, weekly, monthly)")
            }
        }
    }
}

/// Rejected user input. Lists every violated constraint, not just the first.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {}", join_violations(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub fn single(violation: Violation) -> Self {
        Self {
            violations: vec![violation],
        }
    }

    pub fn contains(&self, violation: &Violation) -> bool {
        self.violations.contains(violation)
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum BoardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("task not found: {0}")]
    NotFound(String),

    #[error("task id prefix {0:?} matches more than one task")]
    AmbiguousId(String),

    #[error("task already exists: {0}")]
    DuplicateId(String),

    #[error("cannot {action} task {id} while it is {from}")]
    InvalidTransition {
        id: String,
        from: Status,
        action: &'static str,
    },

    #[error("response does not answer the pending request: {0}")]
    UnexpectedResponse(String),
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("backup is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("backup is not a valid board: {0}")]
    Json(#[from] serde_json::Error),

    #[error("backup contains duplicate task id {0}")]
    DuplicateId(String),
}
