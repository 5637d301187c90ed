//! In-memory vector store with cosine similarity search.

use std::sync::Arc;

use super::document::Document;
use super::embedder::Embedder;
use super::error::EmbeddingError;

/// Holds embedded documents for the lifetime of the process.
pub struct InMemoryVectorStore {
    embedder: Arc<dyn Embedder>,
    entries: Vec<(Document, Vec<f32>)>,
}

impl InMemoryVectorStore {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            entries: Vec::new(),
        }
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Embeds and stores `documents`. Adding nothing is a no-op.
    pub async fn add_documents(&mut self, documents: Vec<Document>) -> Result<usize, EmbeddingError> {
        if documents.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let vectors = self.embedder.embed(&texts).await?;

        if vectors.len() != documents.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: documents.len(),
                actual: vectors.len(),
            });
        }

        let added = documents.len();
        self.entries.extend(documents.into_iter().zip(vectors));
        tracing::debug!(added, total = self.entries.len(), "Stored document chunks");
        Ok(added)
    }

    /// Returns up to `k` documents with their cosine similarity to `query`,
    /// most similar first.
    pub async fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<(Document, f32)>, EmbeddingError> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed_query(query).await?;

        let mut scored: Vec<(&Document, f32)> = self
            .entries
            .iter()
            .map(|(doc, vector)| (doc, cosine_similarity(&query_vector, vector)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored.into_iter().map(|(doc, score)| (doc.clone(), score)).collect())
    }

    /// Like [`similarity_search_with_score`](Self::similarity_search_with_score) without the scores.
    pub async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Document>, EmbeddingError> {
        Ok(self
            .similarity_search_with_score(query, k)
            .await?
            .into_iter()
            .map(|(doc, _)| doc)
            .collect())
    }

    /// Drops every stored document.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cosine similarity of two vectors; 0.0 when either has zero norm or the
/// lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_degenerate() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }
}
