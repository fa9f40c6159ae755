//! One open board: tasks, their timers and the store they are saved to.
//!
//! Every mutating call runs to completion and then saves. A failed save
//! is logged and otherwise ignored; the in-memory board stays
//! authoritative.

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::board::Board;
use crate::datastore::Persistence;
use crate::error::{BoardError, TransferError};
use crate::lifecycle::{self, Action, Outcome};
use crate::prompt::{Answer, InputRequest, InputResponse};
use crate::task::{NewTask, Status, Task, parse_extra_minutes};
use crate::timer::{TickReport, TimerEngine};
use crate::transfer;
use crate::view::BoardView;

#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Put a starter task on an empty board.
    pub seed_empty: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self { seed_empty: true }
    }
}

/// Result of submitting the new-task form.
#[derive(Debug, Clone)]
pub enum Submission {
    Created { task_id: String },
    NeedsInput(InputRequest),
}

#[derive(Debug)]
pub struct Session<P: Persistence> {
    board: Board,
    timers: TimerEngine,
    store: P,
}

impl<P: Persistence> Session<P> {
    /// Loads the board, seeds it if empty and picks up timers that were
    /// running when it was saved.
    #[instrument(skip(store, now, options))]
    pub fn open(store: P, now: DateTime<Utc>, options: SessionOptions) -> Self {
        let board = store.load();
        let mut session = Self {
            board,
            timers: TimerEngine::new(),
            store,
        };

        if session.board.is_empty() && options.seed_empty {
            info!("empty board; adding starter task");
            session.board.tasks.push(Task::seed(now));
        }

        let recovered = session.timers.recover(&mut session.board.tasks, now);
        info!(
            tasks = session.board.len(),
            recovered, "opened board session"
        );
        session.persist();
        session
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn timers(&self) -> &TimerEngine {
        &self.timers
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    pub fn view(&self, now: DateTime<Utc>) -> BoardView {
        BoardView::build(&self.board, &self.timers, now)
    }

    /// Resolves a full id or unique prefix to the task's id.
    pub fn resolve(&self, token: &str) -> Result<String, BoardError> {
        self.board.resolve(token)
    }

    pub fn task(&self, token: &str) -> Result<&Task, BoardError> {
        let id = self.resolve(token)?;
        self.board.find(&id).ok_or(BoardError::NotFound(id))
    }

    fn persist(&self) {
        if let Err(err) = self.store.save(&self.board) {
            warn!(error = %format!("{err:#}"), "failed to save board; keeping in-memory state");
        }
    }

    fn act(&mut self, token: &str, action: Action, now: DateTime<Utc>) -> Result<Outcome, BoardError> {
        let id = self.resolve(token)?;
        let task = self
            .board
            .find_mut(&id)
            .ok_or_else(|| BoardError::NotFound(id.clone()))?;
        let outcome = lifecycle::apply(task, &mut self.timers, action, now)?;
        if outcome != Outcome::Unchanged {
            self.persist();
        }
        Ok(outcome)
    }

    /// Validates the form and adds the task, or asks for a repeat interval
    /// when repeating was requested without one.
    #[instrument(skip(self, draft, now))]
    pub fn submit(&mut self, draft: NewTask, now: DateTime<Utc>) -> Result<Submission, BoardError> {
        if draft.repeat.as_deref().is_some_and(|raw| raw.trim().is_empty()) {
            let mut without_repeat = draft.clone();
            without_repeat.repeat = None;
            without_repeat.validate(now)?;
            return Ok(Submission::NeedsInput(InputRequest::RepeatInterval {
                title: without_repeat.title.trim().to_string(),
                draft,
            }));
        }

        let task = draft.build(now)?;
        let task_id = task.id.clone();
        self.board.add(task)?;
        self.persist();
        info!(id = %task_id, "task created");
        Ok(Submission::Created { task_id })
    }

    pub fn start(&mut self, token: &str, now: DateTime<Utc>) -> Result<Outcome, BoardError> {
        self.act(token, Action::Start, now)
    }

    pub fn pause(&mut self, token: &str, now: DateTime<Utc>) -> Result<Outcome, BoardError> {
        self.act(token, Action::Pause, now)
    }

    pub fn resume(&mut self, token: &str, now: DateTime<Utc>) -> Result<Outcome, BoardError> {
        self.act(token, Action::Resume, now)
    }

    /// A drag-and-drop intent. Same transitions as the buttons, no confirmation.
    pub fn move_task(
        &mut self,
        token: &str,
        status: Status,
        now: DateTime<Utc>,
    ) -> Result<Outcome, BoardError> {
        self.act(token, Action::MoveTo(status), now)
    }

    pub fn request_complete(&self, token: &str) -> Result<InputRequest, BoardError> {
        let task = self.task(token)?;
        if task.status != Status::InProgress {
            return Err(BoardError::InvalidTransition {
                id: task.id.clone(),
                from: task.status,
                action: "complete",
            });
        }
        Ok(InputRequest::ConfirmComplete {
            task_id: task.id.clone(),
            title: task.title.clone(),
        })
    }

    pub fn request_delete(&self, token: &str) -> Result<InputRequest, BoardError> {
        let task = self.task(token)?;
        Ok(InputRequest::ConfirmDelete {
            task_id: task.id.clone(),
            title: task.title.clone(),
        })
    }

    pub fn request_extra_minutes(&self, token: &str) -> Result<InputRequest, BoardError> {
        let task = self.task(token)?;
        if task.status == Status::Todo {
            return Err(BoardError::InvalidTransition {
                id: task.id.clone(),
                from: task.status,
                action: "log minutes on",
            });
        }
        Ok(InputRequest::ExtraMinutes {
            task_id: task.id.clone(),
            title: task.title.clone(),
        })
    }

    /// Completes a pending request with the front end's answer.
    #[instrument(skip(self, request, response, now))]
    pub fn answer(
        &mut self,
        request: InputRequest,
        response: InputResponse,
        now: DateTime<Utc>,
    ) -> Result<Answer, BoardError> {
        debug!(?response, "answering input request");
        match (request, response) {
            (_, InputResponse::Cancelled) | (_, InputResponse::Confirmed(false)) => {
                Ok(Answer::Declined)
            }

            (InputRequest::ConfirmComplete { task_id, .. }, InputResponse::Confirmed(true)) => {
                match self.act(&task_id, Action::Complete, now)? {
                    Outcome::Completed { folded, repeated } => Ok(Answer::Completed {
                        task_id,
                        folded,
                        repeated,
                    }),
                    other => Err(BoardError::UnexpectedResponse(format!(
                        "completion produced {other:?}"
                    ))),
                }
            }

            (InputRequest::ConfirmDelete { task_id, .. }, InputResponse::Confirmed(true)) => {
                let task = self.delete_now(&task_id)?;
                Ok(Answer::Deleted {
                    task_id: task.id,
                    title: task.title,
                })
            }

            (InputRequest::ExtraMinutes { task_id, .. }, InputResponse::Text(raw)) => {
                let minutes = parse_extra_minutes(&raw)?;
                let spent = self.add_minutes(&task_id, minutes)?;
                Ok(Answer::MinutesAdded {
                    task_id,
                    minutes,
                    spent,
                })
            }

            (InputRequest::RepeatInterval { mut draft, .. }, InputResponse::Text(raw)) => {
                draft.repeat = Some(raw);
                match self.submit(draft, now)? {
                    Submission::Created { task_id } => Ok(Answer::Created { task_id }),
                    Submission::NeedsInput(again) => Err(BoardError::UnexpectedResponse(
                        again.message(),
                    )),
                }
            }

            (request, response) => Err(BoardError::UnexpectedResponse(format!(
                "{response:?} for {}",
                request.message()
            ))),
        }
    }

    /// Completion with the confirmation already in hand.
    pub fn complete(&mut self, token: &str, now: DateTime<Utc>) -> Result<Answer, BoardError> {
        let request = self.request_complete(token)?;
        self.answer(request, InputResponse::Confirmed(true), now)
    }

    /// Deletion with the confirmation already in hand.
    pub fn delete(&mut self, token: &str) -> Result<Task, BoardError> {
        let id = self.resolve(token)?;
        self.delete_now(&id)
    }

    fn delete_now(&mut self, id: &str) -> Result<Task, BoardError> {
        if let Some(task) = self.board.find_mut(id) {
            self.timers.discard(task);
        }
        let task = self
            .board
            .remove(id)
            .ok_or_else(|| BoardError::NotFound(id.to_string()))?;
        self.persist();
        info!(id = %task.id, "task deleted");
        Ok(task)
    }

    /// Manual time entry. Returns the new spent total.
    #[instrument(skip(self))]
    pub fn add_minutes(&mut self, token: &str, minutes: u32) -> Result<u32, BoardError> {
        let id = self.resolve(token)?;
        let task = self
            .board
            .find_mut(&id)
            .ok_or_else(|| BoardError::NotFound(id.clone()))?;
        if task.status == Status::Todo {
            return Err(BoardError::InvalidTransition {
                id,
                from: Status::Todo,
                action: "log minutes on",
            });
        }
        if minutes == 0 {
            return Err(crate::error::ValidationError::single(
                crate::error::Violation::InvalidMinutes("0".to_string()),
            )
            .into());
        }
        task.spent_minutes = task.spent_minutes.saturating_add(minutes);
        let spent = task.spent_minutes;
        self.persist();
        Ok(spent)
    }

    /// One second of wall-clock time for every running timer.
    pub fn tick(&mut self) -> TickReport {
        let report = self.timers.tick(&mut self.board.tasks);
        if report.ticked > 0 {
            self.persist();
        }
        report
    }

    /// Simulates `seconds` consecutive ticks.
    pub fn run_for(&mut self, seconds: u64) -> u32 {
        let mut folded = 0;
        for _ in 0..seconds {
            folded += self
                .tick()
                .folded
                .iter()
                .map(|(_, minutes)| *minutes)
                .sum::<u32>();
        }
        folded
    }

    pub fn export(&self) -> Result<Vec<u8>, TransferError> {
        transfer::export(&self.board)
    }

    /// Replaces the board with a backup, then reloads as if freshly opened.
    /// A bad backup leaves everything as it was.
    #[instrument(skip(self, bytes, now))]
    pub fn import(&mut self, bytes: &[u8], now: DateTime<Utc>) -> Result<usize, TransferError> {
        let board = transfer::import(bytes)?;
        self.board = board;
        self.timers.reset();
        self.timers.recover(&mut self.board.tasks, now);
        self.persist();
        info!(count = self.board.len(), "imported board");
        Ok(self.board.len())
    }
}
