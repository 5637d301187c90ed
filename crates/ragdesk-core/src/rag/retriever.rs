//! Score filtering and context assembly on top of the vector store.

use super::document::Document;
use super::error::EmbeddingError;
use super::vector_store::InMemoryVectorStore;
use crate::config::{CHARS_PER_TOKEN, CONTEXT_SEPARATOR, DEFAULT_MIN_SCORE, DEFAULT_RETRIEVAL_K};

/// Retrieves relevant chunks and packs them into a bounded context string.
#[derive(Debug, Clone, Copy)]
pub struct Retriever {
    min_score: f32,
    k: usize,
}

impl Default for Retriever {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            k: DEFAULT_RETRIEVAL_K,
        }
    }
}

impl Retriever {
    pub fn new(min_score: f32, k: usize) -> Self {
        Self { min_score, k }
    }

    pub fn min_score(&self) -> f32 {
        self.min_score
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Fetches `k` candidates and keeps those scoring at least `min_score`.
    pub async fn retrieve(
        &self,
        store: &InMemoryVectorStore,
        query: &str,
        k: usize,
    ) -> Result<Vec<Document>, EmbeddingError> {
        let scored = store.similarity_search_with_score(query, k).await?;
        let docs = filter_by_score(scored, self.min_score, k);
        tracing::debug!(query_len = query.len(), retrieved = docs.len(), "Retrieved documents");
        Ok(docs)
    }

    /// Retrieves relevant chunks for `query` and assembles them within
    /// `max_tokens`. Empty when nothing is relevant.
    pub async fn get_context(
        &self,
        store: &InMemoryVectorStore,
        query: &str,
        max_tokens: usize,
    ) -> Result<String, EmbeddingError> {
        let docs = self.retrieve(store, query, self.k).await?;
        Ok(assemble_context(&docs, max_tokens))
    }
}

/// Keeps candidates with `score >= min_score`. When none qualify, falls back
/// to the first `k / 2` candidates in their original order.
pub fn filter_by_score(scored: Vec<(Document, f32)>, min_score: f32, k: usize) -> Vec<Document> {
    if scored.iter().any(|(_, score)| *score >= min_score) {
        return scored
            .into_iter()
            .filter(|(_, score)| *score >= min_score)
            .map(|(doc, _)| doc)
            .collect();
    }

    scored.into_iter().take(k / 2).map(|(doc, _)| doc).collect()
}

/// Concatenates chunk contents with [`CONTEXT_SEPARATOR`] while the
/// estimated token count (characters / 4) fits in `max_tokens`.
///
/// The first chunk that would overflow is cut to the remaining budget with
/// "..." appended (just "..." when the budget is already spent), and nothing
/// after it is included.
pub fn assemble_context(docs: &[Document], max_tokens: usize) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut used = 0;

    for doc in docs {
        let tokens = doc.char_len() / CHARS_PER_TOKEN;

        if used + tokens > max_tokens {
            let remaining = max_tokens.saturating_sub(used);
            let truncated: String = doc.content.chars().take(remaining * CHARS_PER_TOKEN).collect();
            parts.push(format!("{}...", truncated));
            break;
        }

        parts.push(doc.content.clone());
        used += tokens;
    }

    parts.join(CONTEXT_SEPARATOR)
}
