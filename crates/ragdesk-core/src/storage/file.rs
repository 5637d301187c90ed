use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::task::Task;

use super::error::StorageError;
use super::Storage;

/// JSON file storage.
///
/// A task list is one pretty-printed JSON array:
/// ```text
/// [
///   { "id": 1, "title": "...", "description": "...", "completed": false }
/// ]
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStorage;

impl FileStorage {
    pub fn new() -> Self {
        Self
    }

    /// Ensures the parent directory of `path` exists.
    fn ensure_parent_dir(path: &Path) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
            }
        }
        Ok(())
    }
}

impl Storage for FileStorage {
    fn save_tasks(&self, path: &Path, tasks: &[Task]) -> Result<(), StorageError> {
        Self::ensure_parent_dir(path)?;

        let json = serde_json::to_string_pretty(tasks)?;
        fs::write(path, json).map_err(|e| StorageError::io(path, e))?;

        tracing::debug!(path = %path.display(), count = tasks.len(), "Saved tasks");
        Ok(())
    }

    fn load_tasks(&self, path: &Path) -> Result<Option<Vec<Task>>, StorageError> {
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(path).map_err(|e| StorageError::io(path, e))?;
        let tasks: Vec<Task> = serde_json::from_str(&json)?;

        let mut seen = HashSet::with_capacity(tasks.len());
        for task in &tasks {
            if !seen.insert(task.id) {
                return Err(StorageError::DuplicateId(task.id));
            }
        }

        tracing::debug!(path = %path.display(), count = tasks.len(), "Loaded tasks");
        Ok(Some(tasks))
    }
}
