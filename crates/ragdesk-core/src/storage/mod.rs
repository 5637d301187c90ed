mod error;
mod file;

pub use error::StorageError;
pub use file::FileStorage;

use std::path::Path;

use crate::task::Task;

/// Trait for task persistence backends.
///
/// Implementations read and write a whole task list at a location.
pub trait Storage {
    /// Writes all tasks to `path`, replacing any previous content.
    fn save_tasks(&self, path: &Path, tasks: &[Task]) -> Result<(), StorageError>;

    /// Reads the tasks stored at `path`.
    ///
    /// Returns `Ok(None)` when nothing has been saved there yet.
    fn load_tasks(&self, path: &Path) -> Result<Option<Vec<Task>>, StorageError>;
}
