use std::cell::RefCell;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::board::Board;

pub const BOARD_FILE_NAME: &str = "focusboard-data.json";

/// Where the board lives between sessions.
///
/// `load` never fails: a missing or unreadable payload is a fresh start.
pub trait Persistence {
    fn load(&self) -> Board;
    fn save(&self, board: &Board) -> anyhow::Result<()>;
}

#[derive(Debug)]
pub struct FileStore {
    pub data_dir: PathBuf,
    pub board_path: PathBuf,
}

impl FileStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let board_path = data_dir.join(BOARD_FILE_NAME);

        info!(
            data_dir = %data_dir.display(),
            board = %board_path.display(),
            "opened datastore"
        );

        Ok(Self {
            data_dir,
            board_path,
        })
    }
}

impl Persistence for FileStore {
    #[tracing::instrument(skip(self))]
    fn load(&self) -> Board {
        if !self.board_path.exists() {
            debug!(file = %self.board_path.display(), "no saved board; starting empty");
            return Board::new();
        }

        match fs::read_to_string(&self.board_path) {
            Ok(raw) => parse_board_or_empty(&raw, &self.board_path.display().to_string()),
            Err(err) => {
                warn!(
                    file = %self.board_path.display(),
                    error = %err,
                    "failed reading saved board; starting empty"
                );
                Board::new()
            }
        }
    }

    #[tracing::instrument(skip(self, board), fields(count = board.len()))]
    fn save(&self, board: &Board) -> anyhow::Result<()> {
        save_json_atomic(&self.board_path, board)
            .with_context(|| format!("failed to save {}", self.board_path.display()))
    }
}

/// Keeps the serialized board in memory, the way a browser key-value slot would.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: RefCell<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(raw: impl Into<String>) -> Self {
        Self {
            slot: RefCell::new(Some(raw.into())),
        }
    }

    pub fn payload(&self) -> Option<String> {
        self.slot.borrow().clone()
    }
}

impl Persistence for MemoryStore {
    fn load(&self) -> Board {
        match self.slot.borrow().as_deref() {
            Some(raw) => parse_board_or_empty(raw, "memory"),
            None => Board::new(),
        }
    }

    fn save(&self, board: &Board) -> anyhow::Result<()> {
        let raw = serde_json::to_string(board)?;
        *self.slot.borrow_mut() = Some(raw);
        Ok(())
    }
}

fn parse_board_or_empty(raw: &str, source: &str) -> Board {
    if raw.trim().is_empty() {
        return Board::new();
    }
    match serde_json::from_str::<Board>(raw) {
        Ok(mut board) => {
            board.normalize();
            debug!(source, count = board.len(), "loaded board");
            board
        }
        Err(err) => {
            warn!(source, error = %err, "saved board is corrupt; starting empty");
            Board::new()
        }
    }
}

#[tracing::instrument(skip(path, board))]
fn save_json_atomic(path: &Path, board: &Board) -> anyhow::Result<()> {
    debug!(file = %path.display(), count = board.len(), "saving board atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer(&mut temp, board)?;
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}
