use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metadata key naming where a chunk came from.
pub const SOURCE_KEY: &str = "source";
/// Metadata key naming the kind of input ("text", "pdf", ...).
pub const TYPE_KEY: &str = "type";
/// Metadata key holding the chunk's position within its source.
pub const CHUNK_KEY: &str = "chunk";

/// A piece of text plus metadata, the unit of embedding and retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Adds a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }

    pub fn doc_type(&self) -> Option<&str> {
        self.metadata.get(TYPE_KEY).map(String::as_str)
    }

    /// Number of characters in the content.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}
