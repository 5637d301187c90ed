use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::llm::{Message, Role};

/// One turn of the conversation as kept in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// The message as sent to the model; the timestamp stays local.
    pub fn to_message(&self) -> Message {
        Message {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// Returns the tail of `history` used as model memory.
///
/// At most `window` messages are kept, and leading messages are dropped until
/// the first one is from the user.
pub fn trim_history(history: &[ChatMessage], window: usize) -> &[ChatMessage] {
    let start = history.len().saturating_sub(window);
    let recent = &history[start..];

    match recent.iter().position(|m| m.role == Role::User) {
        Some(first_user) => &recent[first_user..],
        None => &[],
    }
}
