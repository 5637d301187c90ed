//! Retrieval-augmented generation building blocks.
//!
//! Documents are loaded and split by the [`DocumentProcessor`], embedded into
//! an [`InMemoryVectorStore`], and turned into prompt context by the
//! [`Retriever`].

pub mod document;
pub mod embedder;
pub mod error;
pub mod processor;
pub mod retriever;
pub mod splitter;
pub mod vector_store;

pub use document::Document;
pub use embedder::{build_embedder, Embedder, FastEmbedder, OpenAIEmbedder};
pub use error::{EmbeddingError, ProcessorError};
pub use processor::{DocumentProcessor, SUPPORTED_EXTENSIONS};
pub use retriever::{assemble_context, filter_by_score, Retriever};
pub use splitter::RecursiveTextSplitter;
pub use vector_store::{cosine_similarity, InMemoryVectorStore};
