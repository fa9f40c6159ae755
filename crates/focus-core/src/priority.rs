use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::datetime::deadline_instant;
use crate::task::Task;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Urgent,
    Secondary,
    Postpone,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::Secondary => "secondary",
            Self::Postpone => "postpone",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Buckets a task by how far its deadline is from `now`.
///
/// Deadlines between two and three days out fall in no bucket.
pub fn classify(task: &Task, now: DateTime<Utc>) -> Option<Priority> {
    let deadline = deadline_instant(task.deadline_date()?);
    let diff = deadline - now;

    if diff < Duration::zero() {
        Some(Priority::Postpone)
    } else if diff <= Duration::days(2) {
        Some(Priority::Urgent)
    } else if diff > Duration::days(3) {
        Some(Priority::Secondary)
    } else {
        None
    }
}

/// Share of the `created_at → deadline` span already elapsed, clamped to `[0, 1]`.
pub fn deadline_progress(task: &Task, now: DateTime<Utc>) -> Option<f64> {
    let created = task.created_at?;
    let deadline = deadline_instant(task.deadline_date()?);
    let total = (deadline - created).num_seconds();
    if total <= 0 {
        return Some(1.0);
    }
    let elapsed = (now - created).num_seconds();
    Some((elapsed as f64 / total as f64).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::task::Task;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0)
            .single()
            .expect("valid instant")
    }

    fn task_due(deadline: &str) -> Task {
        let mut task = Task::seed(at(2024, 1, 1, 0));
        task.deadline = deadline.to_string();
        task
    }

    #[test]
    fn buckets_by_deadline_distance() {
        let now = at(2024, 1, 10, 0);
        assert_eq!(classify(&task_due("2024-01-11"), now), Some(Priority::Urgent));
        assert_eq!(classify(&task_due("2024-01-15"), now), Some(Priority::Secondary));
        assert_eq!(classify(&task_due("2024-01-08"), now), Some(Priority::Postpone));
    }

    #[test]
    fn bucket_edges() {
        let now = at(2024, 1, 10, 0);
        assert_eq!(classify(&task_due("2024-01-10"), now), Some(Priority::Urgent));
        assert_eq!(classify(&task_due("2024-01-12"), now), Some(Priority::Urgent));
        assert_eq!(classify(&task_due("2024-01-13"), now), None);
        assert_eq!(classify(&task_due("2024-01-14"), now), Some(Priority::Secondary));
    }

    #[test]
    fn same_day_deadline_turns_overdue_after_midnight() {
        let later = at(2024, 1, 10, 8);
        assert_eq!(classify(&task_due("2024-01-10"), later), Some(Priority::Postpone));
    }

    #[test]
    fn unparseable_deadline_has_no_bucket() {
        let now = at(2024, 1, 10, 0);
        assert_eq!(classify(&task_due(""), now), None);
        assert_eq!(classify(&task_due("someday"), now), None);
    }

    #[test]
    fn classify_does_not_touch_the_task() {
        let now = at(2024, 1, 10, 0);
        let task = task_due("2024-01-11");
        let before = task.clone();
        assert_eq!(classify(&task, now), classify(&task, now));
        assert_eq!(task, before);
    }

    #[test]
    fn progress_tracks_created_to_deadline() {
        let mut task = task_due("2024-01-11");
        task.created_at = Some(at(2024, 1, 9, 0));
        assert_eq!(deadline_progress(&task, at(2024, 1, 8, 0)), Some(0.0));
        assert_eq!(deadline_progress(&task, at(2024, 1, 10, 0)), Some(0.5));
        assert_eq!(deadline_progress(&task, at(2024, 1, 12, 0)), Some(1.0));

        task.created_at = None;
        assert_eq!(deadline_progress(&task, at(2024, 1, 10, 0)), None);
    }
}
