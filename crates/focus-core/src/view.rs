use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::board::Board;
use crate::priority::{Priority, classify, deadline_progress};
use crate::task::{RepeatInterval, Status, Task};
use crate::timer::TimerEngine;

/// Everything a front end needs to draw one card.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub title: String,
    pub project: String,
    pub planned_minutes: u32,
    pub spent_minutes: u32,
    pub deadline: String,
    pub status: Status,
    pub priority: Option<Priority>,
    pub running: bool,
    pub paused: bool,
    pub elapsed_seconds: Option<u64>,
    pub deadline_progress: Option<f64>,
    pub repeat_interval: Option<RepeatInterval>,
}

impl Card {
    pub fn from_task(task: &Task, timers: &TimerEngine, now: DateTime<Utc>) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            project: task.project.clone(),
            planned_minutes: task.planned_minutes,
            spent_minutes: task.spent_minutes,
            deadline: task.deadline.clone(),
            status: task.status,
            priority: classify(task, now),
            running: timers.is_running(&task.id),
            paused: timers.is_paused(&task.id),
            elapsed_seconds: timers.elapsed(&task.id),
            deadline_progress: deadline_progress(task, now),
            repeat_interval: task.repeat.then_some(task.repeat_interval).flatten(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Column {
    pub status: Status,
    pub title: &'static str,
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BoardView {
    pub columns: Vec<Column>,
}

impl BoardView {
    pub fn build(board: &Board, timers: &TimerEngine, now: DateTime<Utc>) -> Self {
        let columns = Status::ALL
            .into_iter()
            .map(|status| Column {
                status,
                title: status.column_title(),
                cards: board
                    .by_status(status)
                    .map(|task| Card::from_task(task, timers, now))
                    .collect(),
            })
            .collect();
        Self { columns }
    }

    pub fn column(&self, status: Status) -> Option<&Column> {
        self.columns.iter().find(|c| c.status == status)
    }

    pub fn card(&self, id: &str) -> Option<&Card> {
        self.columns
            .iter()
            .flat_map(|c| c.cards.iter())
            .find(|card| card.id == id)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn groups_cards_in_column_order() {
        let now = Utc
            .with_ymd_and_hms(2024, 1, 10, 9, 0, 0)
            .single()
            .expect("valid now");
        let mut board = Board::new();
        let mut timers = TimerEngine::new();

        let mut doing = Task::seed(now);
        doing.status = Status::InProgress;
        timers.start(&mut doing, now);
        board.add(doing.clone()).expect("add");
        board.add(Task::seed(now)).expect("add");

        let view = BoardView::build(&board, &timers, now);
        let statuses: Vec<Status> = view.columns.iter().map(|c| c.status).collect();
        assert_eq!(statuses, Status::ALL.to_vec());
        assert_eq!(view.column(Status::Todo).map(|c| c.cards.len()), Some(1));

        let card = view.card(&doing.id).expect("card");
        assert!(card.running);
        assert_eq!(card.elapsed_seconds, Some(0));
        assert_eq!(card.priority, Some(Priority::Postpone));
    }
}
