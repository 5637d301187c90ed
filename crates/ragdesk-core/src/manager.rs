use std::path::Path;

use thiserror::Error;

use crate::storage::{Storage, StorageError};
use crate::task::Task;

/// Manages the task list and its persistence.
///
/// Tasks live in memory in insertion order. Ids are handed out from a
/// counter that only moves forward, so deleting a task never frees its id.
pub struct TaskManager<S: Storage> {
    storage: S,
    tasks: Vec<Task>,
    next_id: u64,
}

/// Result of loading a task file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The file existed; the store now holds this many tasks.
    Loaded(usize),
    /// No file at the path; the store is unchanged.
    Missing,
}

impl<S: Storage> TaskManager<S> {
    /// Creates an empty TaskManager with the given storage backend.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            tasks: Vec::new(),
            next_id: 1,
        }
    }

    /// Adds a task with the next unused id.
    pub fn add_task(&mut self, title: &str, description: &str) -> &Task {
        let task = Task::new(self.next_id, title, description);
        self.next_id += 1;
        tracing::debug!(id = task.id, "Added task");
        self.tasks.push(task);
        &self.tasks[self.tasks.len() - 1]
    }

    /// All tasks in insertion order.
    pub fn list_tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Gets a task by id.
    pub fn get_task(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Id the next added task will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Marks a task as completed.
    pub fn complete_task(&mut self, id: u64) -> Result<&Task, ManagerError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(ManagerError::NotFound(id))?;
        task.mark_completed();
        Ok(task)
    }

    /// Deletes a task by id, returning it.
    pub fn delete_task(&mut self, id: u64) -> Result<Task, ManagerError> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(ManagerError::NotFound(id))?;
        Ok(self.tasks.remove(index))
    }

    /// Saves all tasks to `path`.
    pub fn save_tasks(&self, path: impl AsRef<Path>) -> Result<(), ManagerError> {
        self.storage.save_tasks(path.as_ref(), &self.tasks)?;
        Ok(())
    }

    /// Replaces the task list with the one stored at `path`.
    ///
    /// The id counter restarts at one past the highest loaded id.
    pub fn load_tasks(&mut self, path: impl AsRef<Path>) -> Result<LoadOutcome, ManagerError> {
        let Some(tasks) = self.storage.load_tasks(path.as_ref())? else {
            return Ok(LoadOutcome::Missing);
        };

        self.next_id = tasks.iter().map(|t| t.id).max().map_or(1, |max| max + 1);
        self.tasks = tasks;
        Ok(LoadOutcome::Loaded(self.tasks.len()))
    }
}

/// Errors that can occur in TaskManager operations.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Task ID {0} not found.")]
    NotFound(u64),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileStorage;

    fn create_test_manager() -> TaskManager<FileStorage> {
        TaskManager::new(FileStorage::new())
    }

    #[test]
    fn test_add_assigns_sequential_ids() {
        let mut manager = create_test_manager();

        assert_eq!(manager.add_task("Buy groceries", "Milk, Bread, Eggs").id, 1);
        assert_eq!(manager.add_task("Read book", "Finish reading '1984'").id, 2);
        assert_eq!(manager.next_id(), 3);
    }

    #[test]
    fn test_complete_task() {
        let mut manager = create_test_manager();
        manager.add_task("Task", "desc");

        let task = manager.complete_task(1).unwrap();
        assert!(task.completed);
        assert_eq!(task.status(), "Completed");
    }

    #[test]
    fn test_delete_returns_task() {
        let mut manager = create_test_manager();
        manager.add_task("Task to delete", "");

        let removed = manager.delete_task(1).unwrap();
        assert_eq!(removed.title, "Task to delete");
        assert!(manager.list_tasks().is_empty());
    }

    #[test]
    fn test_not_found_message() {
        let err = ManagerError::NotFound(7);
        assert_eq!(err.to_string(), "Task ID 7 not found.");
    }
}
