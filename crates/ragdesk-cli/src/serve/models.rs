//! API request/response models for the assistant server.
//!
//! These are Data Transfer Objects (DTOs) that define the shape of
//! JSON exchanged with the browser page.

use serde::{Deserialize, Serialize};

use ragdesk_core::{Role, SearchHit};

// =============================================================================
// Chat Models
// =============================================================================

/// One line of the conversation shown in the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub role: Role,
    pub content: String,
}

impl ChatEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Body of `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Conversation after a chat action.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub history: Vec<ChatEntry>,
    /// Status line for actions that have one (clearing).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

// =============================================================================
// Document Models
// =============================================================================

/// Body of `POST /api/documents/text`.
#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

/// A human-readable status line.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn new(status: impl Into<String>) -> Self {
        Self { status: status.into() }
    }
}

/// Knowledge base status for `GET /api/status`.
#[derive(Debug, Serialize)]
pub struct KnowledgeBaseStatus {
    pub status: String,
    pub document_count: usize,
    pub has_documents: bool,
}

// =============================================================================
// Search Models (for `/api/documents/search`)
// =============================================================================

/// Query parameters for the search endpoint.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search query string.
    #[serde(default)]
    pub q: String,
}

/// Search results, both formatted for display and structured.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub status: String,
    pub results: Vec<SearchHit>,
}
