use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::warn;
use uuid::Uuid;

use crate::backend::ScrollPositionStore;
use crate::error::BackendError;

/// Last scrolled-to date per board, kept in one small JSON file.
#[derive(Debug, Clone)]
pub struct ScrollFile {
    path: PathBuf,
    positions: BTreeMap<Uuid, NaiveDate>,
}

impl ScrollFile {
    /// Read the file if it exists. An unreadable or malformed file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let positions = match std::fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "ignoring malformed scroll positions");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read scroll positions, starting empty");
                BTreeMap::new()
            }
        };
        Self { path, positions }
    }
}

impl ScrollPositionStore for ScrollFile {
    fn load(&self, board_id: Uuid) -> Option<NaiveDate> {
        self.positions.get(&board_id).copied()
    }

    fn save(&mut self, board_id: Uuid, date: NaiveDate) -> Result<(), BackendError> {
        self.positions.insert(board_id, date);
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&self.positions)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scroll_positions.json");
        let board = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();

        let mut store = ScrollFile::open(&path);
        assert_eq!(store.load(board), None);
        store.save(board, date).unwrap();

        let reopened = ScrollFile::open(&path);
        assert_eq!(reopened.load(board), Some(date));
        assert_eq!(reopened.load(Uuid::new_v4()), None);
    }

    #[test]
    fn malformed_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scroll_positions.json");
        std::fs::write(&path, "[1, 2").unwrap();
        let store = ScrollFile::open(&path);
        assert_eq!(store.load(Uuid::new_v4()), None);
    }

    #[test]
    fn unreadable_path_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be read as a file.
        let store = ScrollFile::open(dir.path());
        assert_eq!(store.load(Uuid::new_v4()), None);
    }
}
