use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::storage;

use super::codec::{Checkpoint, CheckpointState};

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("Checkpoint storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Checkpoint would move backwards from {last_saved} to {attempted}")]
    Regressed { last_saved: usize, attempted: usize },
}

/// One checkpoint file. Remembers the last index it saved so a run can never
/// move its own resume point backwards.
#[derive(Debug)]
pub struct CheckpointStore {
    path: PathBuf,
    last_saved: Option<usize>,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_saved: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_saved(&self) -> Option<usize> {
        self.last_saved
    }

    /// Unreadable or malformed state counts as absent.
    pub fn load<T: CheckpointState>(&mut self) -> Option<Checkpoint<T>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No checkpoint found");
                return None;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Cannot read checkpoint, ignoring it");
                return None;
            }
        };

        match Checkpoint::<T>::parse(&text) {
            Ok(checkpoint) => {
                self.last_saved = Some(checkpoint.next_index);
                Some(checkpoint)
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Corrupt checkpoint, ignoring it");
                None
            }
        }
    }

    pub fn save<T: CheckpointState>(
        &mut self,
        checkpoint: &Checkpoint<T>,
    ) -> Result<(), CheckpointError> {
        if let Some(last_saved) = self.last_saved {
            if checkpoint.next_index < last_saved {
                return Err(CheckpointError::Regressed {
                    last_saved,
                    attempted: checkpoint.next_index,
                });
            }
        }

        storage::write_atomic(&self.path, checkpoint.encode().as_bytes())?;
        self.last_saved = Some(checkpoint.next_index);
        Ok(())
    }

    /// Deletes the file and forgets the last saved index.
    pub fn clear(&mut self) -> Result<(), CheckpointError> {
        storage::remove_if_exists(&self.path)?;
        self.last_saved = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::GapTotals;
    use tempfile::TempDir;

    fn totals(analyzed: u64) -> GapTotals {
        GapTotals {
            analyzed,
            ..GapTotals::default()
        }
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.txt");

        let mut store = CheckpointStore::new(&path);
        store.save(&Checkpoint::new(2, 64, totals(2))).unwrap();

        let mut reopened = CheckpointStore::new(&path);
        let loaded: Checkpoint<GapTotals> = reopened.load().unwrap();
        assert_eq!(loaded, Checkpoint::new(2, 64, totals(2)));
        assert_eq!(reopened.last_saved(), Some(2));
    }

    #[test]
    fn test_missing_file_loads_as_none() {
        let dir = TempDir::new().unwrap();
        let mut store = CheckpointStore::new(dir.path().join("progress.txt"));
        assert!(store.load::<GapTotals>().is_none());
        assert_eq!(store.last_saved(), None);
    }

    #[test]
    fn test_corrupt_file_loads_as_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.txt");
        std::fs::write(&path, "12\ngarbage\n").unwrap();

        let mut store = CheckpointStore::new(&path);
        assert!(store.load::<GapTotals>().is_none());
        assert_eq!(store.last_saved(), None);
    }

    #[test]
    fn test_save_rejects_regression() {
        let dir = TempDir::new().unwrap();
        let mut store = CheckpointStore::new(dir.path().join("progress.txt"));

        store.save(&Checkpoint::new(5, 0, totals(5))).unwrap();
        store.save(&Checkpoint::new(5, 0, totals(5))).unwrap();

        let err = store.save(&Checkpoint::new(4, 0, totals(4))).unwrap_err();
        assert!(matches!(
            err,
            CheckpointError::Regressed {
                last_saved: 5,
                attempted: 4
            }
        ));

        let loaded: Checkpoint<GapTotals> = store.load().unwrap();
        assert_eq!(loaded.next_index, 5);
    }

    #[test]
    fn test_clear_removes_file_and_resets_monotonic_guard() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.txt");
        let mut store = CheckpointStore::new(&path);

        store.save(&Checkpoint::new(9, 0, totals(9))).unwrap();
        store.clear().unwrap();
        assert!(!path.exists());
        store.clear().unwrap();

        store.save(&Checkpoint::new(1, 0, totals(1))).unwrap();
        assert_eq!(store.last_saved(), Some(1));
    }
}
