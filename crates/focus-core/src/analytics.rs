use std::collections::BTreeMap;

use serde::Serialize;

use crate::board::Board;

/// Spent minutes summed per key.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Series {
    pub labels: Vec<String>,
    pub minutes: Vec<u64>,
}

impl Series {
    pub fn total(&self) -> u64 {
        self.minutes.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.minutes.iter().copied())
    }
}

/// Minutes by deadline date, dates ascending.
pub fn minutes_by_day(board: &Board) -> Series {
    let mut days: BTreeMap<&str, u64> = BTreeMap::new();
    for task in board.all() {
        *days.entry(task.deadline.as_str()).or_default() += u64::from(task.spent_minutes);
    }
    Series {
        labels: days.keys().map(|d| d.to_string()).collect(),
        minutes: days.into_values().collect(),
    }
}

/// Minutes by project, in the order projects first appear on the board.
pub fn minutes_by_project(board: &Board) -> Series {
    let mut series = Series::default();
    for task in board.all() {
        let minutes = u64::from(task.spent_minutes);
        match series.labels.iter().position(|p| *p == task.project) {
            Some(idx) => series.minutes[idx] += minutes,
            None => {
                series.labels.push(task.project.clone());
                series.minutes.push(minutes);
            }
        }
    }
    series
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::task::Task;

    fn board() -> Board {
        let now = Utc
            .with_ymd_and_hms(2024, 1, 10, 9, 0, 0)
            .single()
            .expect("valid now");
        let mut board = Board::new();
        for (project, deadline, spent) in [
            ("Work", "2024-01-12", 30),
            ("Home", "2024-01-11", 15),
            ("Work", "2024-01-11", 5),
        ] {
            let mut task = Task::seed(now);
            task.project = project.to_string();
            task.deadline = deadline.to_string();
            task.spent_minutes = spent;
            board.add(task).expect("add");
        }
        board
    }

    #[test]
    fn sums_by_day_in_date_order() {
        let series = minutes_by_day(&board());
        assert_eq!(series.labels, vec!["2024-01-11", "2024-01-12"]);
        assert_eq!(series.minutes, vec![20, 30]);
        assert_eq!(series.total(), 50);
    }

    #[test]
    fn sums_by_project_in_first_seen_order() {
        let series = minutes_by_project(&board());
        let pairs: Vec<(&str, u64)> = series.iter().collect();
        assert_eq!(pairs, vec![("Work", 35), ("Home", 15)]);
    }
}
