use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::BoardError;
use crate::task::{Status, Task};

/// Every task of one session. Unique by id; order carries no meaning.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Board {
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    #[tracing::instrument(skip(self, task), fields(id = %task.id))]
    pub fn add(&mut self, task: Task) -> Result<(), BoardError> {
        if self.find(&task.id).is_some() {
            return Err(BoardError::DuplicateId(task.id));
        }
        self.tasks.push(task);
        debug!(count = self.tasks.len(), "task added to board");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub fn remove(&mut self, id: &str) -> Option<Task> {
        let idx = self.tasks.iter().position(|t| t.id == id)?;
        Some(self.tasks.remove(idx))
    }

    pub fn find(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn all(&self) -> &[Task] {
        &self.tasks
    }

    pub fn by_status(&self, status: Status) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(move |t| t.status == status)
    }

    /// Resolves a full id or a unique id prefix.
    pub fn resolve(&self, token: &str) -> Result<String, BoardError> {
        let token = token.trim();
        if let Some(task) = self.find(token) {
            return Ok(task.id.clone());
        }
        if token.is_empty() {
            return Err(BoardError::NotFound(token.to_string()));
        }

        let mut matches = self.tasks.iter().filter(|t| t.id.starts_with(token));
        let first = matches
            .next()
            .ok_or_else(|| BoardError::NotFound(token.to_string()))?;
        if matches.next().is_some() {
            return Err(BoardError::AmbiguousId(token.to_string()));
        }
        Ok(first.id.clone())
    }

    /// Drops duplicate ids (first wins) and repairs repeat flags that lack an interval.
    #[tracing::instrument(skip(self))]
    pub fn normalize(&mut self) {
        let mut seen = std::collections::BTreeSet::new();
        let before = self.tasks.len();
        self.tasks.retain(|task| seen.insert(task.id.clone()));
        if self.tasks.len() != before {
            warn!(
                dropped = before - self.tasks.len(),
                "dropped tasks with duplicate ids"
            );
        }

        for task in &mut self.tasks {
            if task.repeat && task.repeat_interval.is_none() {
                warn!(id = %task.id, "repeating task without interval; treating as one-off");
                task.repeat = false;
            }
            if task.status != Status::InProgress
                && (task.start_time.is_some() || task.paused_seconds.is_some())
            {
                warn!(id = %task.id, status = %task.status, "task not in progress carried a timer; clearing");
                task.start_time = None;
                task.paused_seconds = None;
                task.folded_minutes = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0)
            .single()
            .expect("valid now")
    }

    fn task_with_id(id: &str) -> Task {
        let mut task = Task::seed(now());
        task.id = id.to_string();
        task
    }

    #[test]
    fn add_find_remove() {
        let mut board = Board::new();
        board.add(task_with_id("a1")).expect("add a1");
        board.add(task_with_id("b2")).expect("add b2");
        assert_eq!(board.len(), 2);
        assert!(board.find("a1").is_some());

        let removed = board.remove("a1").expect("a1 present");
        assert_eq!(removed.id, "a1");
        assert!(board.find("a1").is_none());
        assert!(board.remove("a1").is_none());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut board = Board::new();
        board.add(task_with_id("a1")).expect("add a1");
        let err = board.add(task_with_id("a1")).expect_err("duplicate");
        assert!(matches!(err, BoardError::DuplicateId(id) if id == "a1"));
    }

    #[test]
    fn resolves_unique_prefixes() {
        let mut board = Board::new();
        board.add(task_with_id("abc123")).expect("add");
        board.add(task_with_id("abd456")).expect("add");

        assert_eq!(board.resolve("abc").expect("unique"), "abc123");
        assert_eq!(board.resolve("abd456").expect("exact"), "abd456");
        assert!(matches!(board.resolve("ab"), Err(BoardError::AmbiguousId(_))));
        assert!(matches!(board.resolve("zz"), Err(BoardError::NotFound(_))));
    }

    #[test]
    fn groups_by_status() {
        let mut board = Board::new();
        let mut doing = task_with_id("doing");
        doing.status = Status::InProgress;
        board.add(task_with_id("todo")).expect("add");
        board.add(doing).expect("add");

        let in_progress: Vec<_> = board.by_status(Status::InProgress).collect();
        assert_eq!(in_progress.len(), 1);
        assert_eq!(in_progress[0].id, "doing");
        assert_eq!(board.by_status(Status::Done).count(), 0);
    }

    #[test]
    fn normalize_repairs_loaded_boards() {
        let mut board = Board::new();
        let mut broken = task_with_id("x");
        broken.repeat = true;
        broken.repeat_interval = None;
        broken.status = Status::Done;
        broken.start_time = Some(now());
        board.tasks.push(broken.clone());
        board.tasks.push(broken);

        board.normalize();
        assert_eq!(board.len(), 1);
        assert!(!board.tasks[0].repeat);
        assert!(board.tasks[0].start_time.is_none());
    }

    #[test]
    fn normalize_drops_paused_timer_outside_in_progress() {
        let mut board = Board::new();
        let mut todo = task_with_id("t");
        todo.paused_seconds = Some(45);
        todo.folded_minutes = 2;
        board.add(todo).expect("add");

        board.normalize();
        assert_eq!(board.tasks[0].paused_seconds, None);
        assert_eq!(board.tasks[0].folded_minutes, 0);
    }
}
