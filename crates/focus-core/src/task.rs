use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::datetime::{epoch_millis_serde, format_deadline, parse_deadline, today};
use crate::error::{ValidationError, Violation};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Todo,
    InProgress,
    Done,
}

impl Status {
    /// Column order on the board.
    pub const ALL: [Status; 3] = [Status::Todo, Status::InProgress, Status::Done];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Done => "done",
        }
    }

    pub fn column_title(self) -> &'static str {
        match self {
            Self::Todo => "Planned",
            Self::InProgress => "In progress",
            Self::Done => "Done",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "todo" | "planned" => Ok(Self::Todo),
            "in-progress" | "inprogress" | "progress" | "doing" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            other => Err(anyhow::anyhow!(
                "unknown status {other:?} (todo, in-progress, done)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RepeatInterval {
    Daily,
    Weekly,
    Monthly,
}

impl RepeatInterval {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for RepeatInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepeatInterval {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "day" | "d" => Ok(Self::Daily),
            "weekly" | "week" | "w" => Ok(Self::Weekly),
            "monthly" | "month" | "m" => Ok(Self::Monthly),
            "" => Err(ValidationError::single(Violation::MissingRepeatInterval)),
            other => Err(ValidationError::single(Violation::UnknownRepeatInterval(
                other.to_string(),
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,

    pub title: String,

    pub project: String,

    pub planned_minutes: u32,

    #[serde(default)]
    pub spent_minutes: u32,

    pub deadline: String,

    pub status: Status,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "epoch_millis_serde::option"
    )]
    pub start_time: Option<DateTime<Utc>>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "epoch_millis_serde::option"
    )]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub repeat: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_interval: Option<RepeatInterval>,

    /// Whole minutes of the current timer run already added to `spent_minutes`.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub folded_minutes: u32,

    /// Seconds counted by a paused timer, kept so a later resume picks up
    /// where the pause left off.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused_seconds: Option<u64>,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

impl Task {
    pub fn new_todo(
        title: String,
        project: String,
        planned_minutes: u32,
        deadline: NaiveDate,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            project,
            planned_minutes,
            spent_minutes: 0,
            deadline: format_deadline(deadline),
            status: Status::Todo,
            start_time: None,
            created_at: Some(now),
            repeat: false,
            repeat_interval: None,
            folded_minutes: 0,
            paused_seconds: None,
        }
    }

    /// The task placed on an empty board at first launch.
    pub fn seed(now: DateTime<Utc>) -> Self {
        Self::new_todo(
            "Write the kanban board".to_string(),
            "FocusBoard".to_string(),
            90,
            today(now),
            now,
        )
    }

    pub fn deadline_date(&self) -> Option<NaiveDate> {
        parse_deadline(&self.deadline)
    }

    pub fn is_running(&self) -> bool {
        self.start_time.is_some()
    }

    pub fn short_id(&self) -> &str {
        self.id.get(..8).unwrap_or(&self.id)
    }
}

/// Raw form input for a new task, validated by [`NewTask::build`].
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub project: String,
    pub planned_minutes: i64,
    pub deadline: String,
    pub repeat: Option<String>,
}

impl NewTask {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<ValidatedTask, ValidationError> {
        let mut violations = Vec::new();

        let title = self.title.trim();
        if title.is_empty() {
            violations.push(Violation::EmptyTitle);
        }
        let project = self.project.trim();
        if project.is_empty() {
            violations.push(Violation::EmptyProject);
        }

        let deadline_raw = self.deadline.trim();
        let mut deadline = None;
        if deadline_raw.is_empty() {
            violations.push(Violation::EmptyDeadline);
        } else {
            match parse_deadline(deadline_raw) {
                Some(date) if date < today(now) => violations.push(Violation::DeadlineInPast {
                    deadline: deadline_raw.to_string(),
                    today: format_deadline(today(now)),
                }),
                Some(date) => deadline = Some(date),
                None => violations.push(Violation::MalformedDeadline(deadline_raw.to_string())),
            }
        }

        let planned_minutes = match u32::try_from(self.planned_minutes) {
            Ok(value) if value > 0 => Some(value),
            _ if self.planned_minutes <= 0 => {
                violations.push(Violation::NonPositiveMinutes(self.planned_minutes));
                None
            }
            _ => {
                violations.push(Violation::InvalidMinutes(self.planned_minutes.to_string()));
                None
            }
        };

        let repeat_interval = match self.repeat.as_deref() {
            None => None,
            Some(raw) => match raw.parse::<RepeatInterval>() {
                Ok(interval) => Some(interval),
                Err(err) => {
                    violations.extend(err.violations);
                    None
                }
            },
        };

        match (deadline, planned_minutes) {
            (Some(deadline), Some(planned_minutes)) if violations.is_empty() => {
                Ok(ValidatedTask {
                    title: title.to_string(),
                    project: project.to_string(),
                    planned_minutes,
                    deadline,
                    repeat_interval,
                })
            }
            _ => Err(ValidationError { violations }),
        }
    }

    pub fn build(&self, now: DateTime<Utc>) -> Result<Task, ValidationError> {
        Ok(self.validate(now)?.into_task(now))
    }
}

/// A draft that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedTask {
    pub title: String,
    pub project: String,
    pub planned_minutes: u32,
    pub deadline: NaiveDate,
    pub repeat_interval: Option<RepeatInterval>,
}

impl ValidatedTask {
    pub fn into_task(self, now: DateTime<Utc>) -> Task {
        let mut task = Task::new_todo(
            self.title,
            self.project,
            self.planned_minutes,
            self.deadline,
            now,
        );
        task.repeat = self.repeat_interval.is_some();
        task.repeat_interval = self.repeat_interval;
        task
    }
}

/// Parses a manual minute entry; only positive whole numbers are accepted.
pub fn parse_extra_minutes(input: &str) -> Result<u32, ValidationError> {
    let trimmed = input.trim();
    match trimmed.parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ValidationError::single(Violation::InvalidMinutes(
            trimmed.to_string(),
        ))),
    }
}
