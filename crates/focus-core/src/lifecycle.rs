//! Status transitions of a single task.
//!
//! `todo → in-progress → done`, with pause/resume inside `in-progress`
//! and drag moves between any two columns. Timers are deregistered
//! before the status changes so no tick lands on a finished task.

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use crate::error::BoardError;
use crate::repeat;
use crate::task::{Status, Task};
use crate::timer::TimerEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Pause,
    Resume,
    Complete,
    /// A drag to another column.
    MoveTo(Status),
}

impl Action {
    fn verb(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Complete => "complete",
            Self::MoveTo(Status::Todo) => "move to todo",
            Self::MoveTo(Status::InProgress) => "move to in-progress",
            Self::MoveTo(Status::Done) => "move to done",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Started,
    Paused { folded: u32 },
    Resumed,
    Completed { folded: u32, repeated: bool },
    /// Moved back to `todo`; the unfinished minute is gone.
    Reverted,
    Unchanged,
}

#[instrument(skip(task, timers, now), fields(id = %task.id, status = %task.status))]
pub fn apply(
    task: &mut Task,
    timers: &mut TimerEngine,
    action: Action,
    now: DateTime<Utc>,
) -> Result<Outcome, BoardError> {
    let outcome = match (action, task.status) {
        (Action::Start, Status::Todo) => begin_run(task, timers, now),
        (Action::Start | Action::Resume, Status::InProgress) => {
            if timers.is_running(&task.id) {
                debug!("timer already running");
                Outcome::Unchanged
            } else {
                timers.start(task, now);
                Outcome::Resumed
            }
        }
        (Action::Pause, Status::InProgress) if timers.is_running(&task.id) => {
            let folded = timers.pause(task);
            Outcome::Paused { folded }
        }
        (Action::Complete, Status::InProgress) => finish(task, timers),

        (Action::MoveTo(target), current) if target == current => Outcome::Unchanged,
        (Action::MoveTo(Status::InProgress), _) => begin_run(task, timers, now),
        (Action::MoveTo(Status::Done), _) => finish(task, timers),
        (Action::MoveTo(Status::Todo), _) => {
            timers.discard(task);
            task.status = Status::Todo;
            Outcome::Reverted
        }

        (action, from) => {
            return Err(BoardError::InvalidTransition {
                id: task.id.clone(),
                from,
                action: action.verb(),
            });
        }
    };

    info!(?action, ?outcome, status = %task.status, "applied lifecycle action");
    Ok(outcome)
}

fn begin_run(task: &mut Task, timers: &mut TimerEngine, now: DateTime<Utc>) -> Outcome {
    timers.discard(task);
    task.status = Status::InProgress;
    timers.start(task, now);
    Outcome::Started
}

fn finish(task: &mut Task, timers: &mut TimerEngine) -> Outcome {
    let folded = timers.stop(task);
    task.status = Status::Done;

    let repeated = task.repeat;
    if repeated {
        *task = repeat::advance(task.clone());
    }
    Outcome::Completed { folded, repeated }
}
