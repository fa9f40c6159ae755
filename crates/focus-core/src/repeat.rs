use chrono::{Days, Months, NaiveDate};
use tracing::{debug, warn};

use crate::datetime::format_deadline;
use crate::task::{RepeatInterval, Status, Task};

/// Next deadline one interval after `from`. Monthly steps clamp to the
/// last day of a shorter month (Jan 31 → Feb 29).
pub fn next_deadline(from: NaiveDate, interval: RepeatInterval) -> Option<NaiveDate> {
    match interval {
        RepeatInterval::Daily => from.checked_add_days(Days::new(1)),
        RepeatInterval::Weekly => from.checked_add_days(Days::new(7)),
        RepeatInterval::Monthly => from.checked_add_months(Months::new(1)),
    }
}

/// Starts the next cycle of a completed repeating task.
///
/// The task keeps status `done` with its deadline moved forward and spent
/// time cleared; `repeat` and `repeat_interval` stay as they were.
#[tracing::instrument(skip(task), fields(id = %task.id, deadline = %task.deadline))]
pub fn advance(mut task: Task) -> Task {
    let Some(interval) = task.repeat_interval else {
        warn!("repeating task has no interval; leaving deadline unchanged");
        task.spent_minutes = 0;
        task.status = Status::Done;
        return task;
    };

    match task
        .deadline_date()
        .and_then(|date| next_deadline(date, interval))
    {
        Some(next) => {
            debug!(next = %next, %interval, "advanced repeating task");
            task.deadline = format_deadline(next);
        }
        None => warn!(%interval, "cannot read deadline; leaving it unchanged"),
    }

    task.spent_minutes = 0;
    task.folded_minutes = 0;
    task.start_time = None;
    task.status = Status::Done;
    task
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn repeating(deadline: &str, interval: RepeatInterval) -> Task {
        let now = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .expect("valid now");
        let mut task = Task::seed(now);
        task.deadline = deadline.to_string();
        task.repeat = true;
        task.repeat_interval = Some(interval);
        task.spent_minutes = 42;
        task.status = Status::InProgress;
        task
    }

    #[test]
    fn advances_by_interval() {
        let cases = [
            ("2024-01-10", RepeatInterval::Daily, "2024-01-11"),
            ("2024-01-10", RepeatInterval::Weekly, "2024-01-17"),
            ("2024-01-10", RepeatInterval::Monthly, "2024-02-10"),
            ("2024-12-31", RepeatInterval::Daily, "2025-01-01"),
            ("2024-01-31", RepeatInterval::Monthly, "2024-02-29"),
        ];
        for (from, interval, expected) in cases {
            let next = advance(repeating(from, interval));
            assert_eq!(next.deadline, expected, "{from} + {interval}");
        }
    }

    #[test]
    fn resets_spent_and_keeps_repeat_settings() {
        let next = advance(repeating("2024-01-10", RepeatInterval::Weekly));
        assert_eq!(next.spent_minutes, 0);
        assert_eq!(next.status, Status::Done);
        assert!(next.repeat);
        assert_eq!(next.repeat_interval, Some(RepeatInterval::Weekly));
        assert!(next.start_time.is_none());
    }

    #[test]
    fn unreadable_deadline_is_kept() {
        let next = advance(repeating("whenever", RepeatInterval::Daily));
        assert_eq!(next.deadline, "whenever");
        assert_eq!(next.spent_minutes, 0);
    }
}
