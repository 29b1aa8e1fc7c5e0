use crate::error::{Error, Result};
use crate::kanban_board::Board;
use crate::storage::KeyValueStore;
use chrono::Utc;

pub const DEFAULT_KEY: &str = "kanban-columns";

/// Holds the current board and writes it through to storage after every
/// change.
#[derive(Debug)]
pub struct BoardStore<S: KeyValueStore> {
    storage: S,
    key: String,
    board: Board,
    last_id: i64,
}

impl<S: KeyValueStore> BoardStore<S> {
    /// Falls back to the default board when nothing usable is stored.
    pub fn load(storage: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let board = read_board(&storage, &key);
        Self {
            storage,
            key,
            board,
            last_id: 0,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn persist(&mut self) -> Result<()> {
        let data = serde_json::to_string(&self.board)?;
        self.storage.set(&self.key, &data)
    }

    /// Returns the new task's id, or `None` when the title is blank or the
    /// column is unknown.
    pub fn add_task(
        &mut self,
        column_id: &str,
        title: &str,
        description: &str,
    ) -> Result<Option<String>> {
        if title.trim().is_empty() || self.board.column(column_id).is_none() {
            log::debug!("Rejected new task for column {}", column_id);
            return Ok(None);
        }

        let id = self.next_id(Utc::now().timestamp_millis());
        let next = self.board.add_task(column_id, &id, title, description);
        self.replace(next)?;
        log::info!("Added task {} to column {}", id, column_id);
        Ok(Some(id))
    }

    pub fn delete_task(&mut self, column_id: &str, task_id: &str) -> Result<bool> {
        let next = self.board.delete_task(column_id, task_id);
        let changed = self.replace(next)?;
        if changed {
            log::info!("Deleted task {} from column {}", task_id, column_id);
        }
        Ok(changed)
    }

    pub fn move_task(&mut self, from_column: &str, to_column: &str, task_id: &str) -> Result<bool> {
        let next = self.board.move_task(from_column, to_column, task_id);
        let changed = self.replace(next)?;
        if changed {
            log::info!("Moved task {} from column {} to {}", task_id, from_column, to_column);
        }
        Ok(changed)
    }

    fn replace(&mut self, next: Board) -> Result<bool> {
        if next == self.board {
            return Ok(false);
        }
        self.board = next;
        self.persist()?;
        Ok(true)
    }

    /// Millisecond timestamp ids, bumped past anything already issued or
    /// already on the board.
    fn next_id(&mut self, now_ms: i64) -> String {
        let mut candidate = now_ms.max(self.last_id + 1);
        while self.board.contains_task(&candidate.to_string()) {
            candidate += 1;
        }
        self.last_id = candidate;
        candidate.to_string()
    }
}

fn read_board<S: KeyValueStore>(storage: &S, key: &str) -> Board {
    let data = match storage.get(key) {
        Ok(Some(data)) => data,
        Ok(None) => {
            log::info!("No saved board under {}, starting empty", key);
            return Board::default();
        }
        Err(err) => {
            log::warn!("Failed to read saved board: {}", err);
            return Board::default();
        }
    };

    let parsed = serde_json::from_str::<Board>(&data)
        .map_err(Error::from)
        .and_then(|board| board.validate().map(|_| board));
    match parsed {
        Ok(board) => board,
        Err(err) => {
            log::warn!("Ignoring saved board: {}", err);
            Board::default()
        }
    }
}
