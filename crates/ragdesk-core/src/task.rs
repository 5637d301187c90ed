use std::fmt;

use serde::{Deserialize, Serialize};

/// A single entry in the task list.
///
/// Serialized verbatim as `{id, title, description, completed}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Identifier assigned by the manager, unique within a store
    pub id: u64,
    /// Short title
    pub title: String,
    /// Free-form description
    pub description: String,
    /// Whether the task has been marked done
    pub completed: bool,
}

impl Task {
    /// Creates a pending task.
    pub fn new(id: u64, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            completed: false,
        }
    }

    /// Marks the task as completed.
    pub fn mark_completed(&mut self) {
        self.completed = true;
    }

    /// Human-readable status label.
    pub fn status(&self) -> &'static str {
        if self.completed {
            "Completed"
        } else {
            "Pending"
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Task: {}\nDescription: {}\nStatus: {}",
            self.title,
            self.description,
            self.status()
        )
    }
}
