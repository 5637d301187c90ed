//! RAG error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or splitting documents.
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to extract PDF text: {0}")]
    Pdf(String),

    #[error("Failed to read DOCX: {0}")]
    Docx(String),

    #[error("File is not valid UTF-8 text: {0}")]
    Encoding(String),

    #[error("chunk_overlap ({overlap}) must be smaller than chunk_size ({size})")]
    InvalidChunking { size: usize, overlap: usize },
}

impl ProcessorError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProcessorError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised by embedding backends and the vector store.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Missing API key for the embeddings endpoint")]
    MissingApiKey,

    #[error("Embedding request failed: {0}")]
    Request(String),

    #[error("Embeddings API returned error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Embedding model error: {0}")]
    Model(String),

    #[error("Expected {expected} embeddings, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("Unknown embedding provider: {0}")]
    UnknownProvider(String),
}

impl From<reqwest::Error> for EmbeddingError {
    fn from(err: reqwest::Error) -> Self {
        EmbeddingError::Request(err.to_string())
    }
}
