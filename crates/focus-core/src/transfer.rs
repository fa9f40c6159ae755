//! Backup files: the whole board as pretty-printed UTF-8 JSON.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::board::Board;
use crate::error::TransferError;

pub const EXPORT_FILE_NAME: &str = "focus-board-backup.json";

#[tracing::instrument(skip(board), fields(count = board.len()))]
pub fn export(board: &Board) -> Result<Vec<u8>, TransferError> {
    let mut out = serde_json::to_vec_pretty(board)?;
    out.push(b'\n');
    debug!(bytes = out.len(), "exported board");
    Ok(out)
}

/// Parses a backup. Nothing is replaced here; the caller swaps boards
/// only when this succeeds.
#[tracing::instrument(skip(bytes), fields(bytes = bytes.len()))]
pub fn import(bytes: &[u8]) -> Result<Board, TransferError> {
    let text = std::str::from_utf8(bytes)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut board: Board = serde_json::from_str(text)?;

    {
        let mut seen = BTreeSet::new();
        for task in &board.tasks {
            if !seen.insert(task.id.as_str()) {
                return Err(TransferError::DuplicateId(task.id.clone()));
            }
        }
    }

    board.normalize();
    info!(count = board.len(), "parsed board backup");
    Ok(board)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::task::{RepeatInterval, Status, Task};

    fn sample_board() -> Board {
        let now = Utc
            .with_ymd_and_hms(2024, 1, 10, 9, 0, 0)
            .single()
            .expect("valid now");
        let mut board = Board::new();

        let mut running = Task::seed(now);
        running.status = Status::InProgress;
        running.start_time = Some(now);
        running.spent_minutes = 12;
        running.folded_minutes = 2;
        board.add(running).expect("add");

        let mut weekly = Task::seed(now);
        weekly.title = "Review inbox".to_string();
        weekly.repeat = true;
        weekly.repeat_interval = Some(RepeatInterval::Weekly);
        board.add(weekly).expect("add");

        board
    }

    #[test]
    fn import_of_export_is_identity() {
        let board = sample_board();
        let bytes = export(&board).expect("export");
        let text = std::str::from_utf8(&bytes).expect("utf8");
        assert!(text.contains("\n  \"tasks\""));

        let restored = import(&bytes).expect("import");
        assert_eq!(restored, board);
    }

    #[test]
    fn accepts_browser_backup() {
        let raw = br#"{"tasks":[{"id":"1","title":"Write kanban","project":"FocusBoard","plannedMinutes":90,"spentMinutes":0,"deadline":"2024-01-10","status":"todo"}]}"#;
        let board = import(raw).expect("import");
        assert_eq!(board.len(), 1);
        assert_eq!(board.tasks[0].status, Status::Todo);
    }

    #[test]
    fn rejects_malformed_backups() {
        assert!(matches!(import(b"{\"tasks\": ["), Err(TransferError::Json(_))));
        assert!(matches!(import(&[0xff, 0xfe, 0x00]), Err(TransferError::Utf8(_))));
        assert!(matches!(
            import(br#"{"tasks":[{"id":"1","status":"paused"}]}"#),
            Err(TransferError::Json(_))
        ));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut board = sample_board();
        let copy = board.tasks[0].clone();
        board.tasks.push(copy);
        let bytes = export(&board).expect("export");
        assert!(matches!(import(&bytes), Err(TransferError::DuplicateId(_))));
    }
}
