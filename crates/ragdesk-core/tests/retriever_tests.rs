use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use ragdesk_core::rag::{
    assemble_context, filter_by_score, Document, Embedder, EmbeddingError, InMemoryVectorStore, Retriever,
};

/// Embeds text as keyword counts over a tiny vocabulary.
#[derive(Default)]
struct KeywordEmbedder {
    calls: AtomicUsize,
}

const VOCAB: &[&str] = &["rust", "python", "cooking"];

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|t| {
                let lower = t.to_lowercase();
                VOCAB.iter().map(|w| lower.matches(w).count() as f32).collect()
            })
            .collect())
    }

    fn model_name(&self) -> &str {
        "keyword"
    }
}

fn scored(scores: &[f32]) -> Vec<(Document, f32)> {
    scores
        .iter()
        .enumerate()
        .map(|(i, s)| (Document::new(format!("doc{}", i)), *s))
        .collect()
}

fn contents(docs: &[Document]) -> Vec<&str> {
    docs.iter().map(|d| d.content.as_str()).collect()
}

#[test]
fn test_filter_keeps_relevant() {
    let kept = filter_by_score(scored(&[0.9, 0.5, 0.1]), 0.3, 3);
    assert_eq!(contents(&kept), vec!["doc0", "doc1"]);
}

#[test]
fn test_filter_fallback_floor_half_k() {
    let kept = filter_by_score(scored(&[0.2, 0.1, 0.05]), 0.3, 3);
    assert_eq!(contents(&kept), vec!["doc0"]);
}

#[test]
fn test_context_truncation() {
    // 80 chars = 20 tokens against a budget of 10: 40 chars survive.
    let docs = vec![Document::new("z".repeat(80))];
    assert_eq!(assemble_context(&docs, 10), format!("{}...", "z".repeat(40)));
}

#[tokio::test]
async fn test_empty_store_skips_embedding() {
    let embedder = Arc::new(KeywordEmbedder::default());
    let store = InMemoryVectorStore::new(embedder.clone());

    let results = store.similarity_search_with_score("rust", 4).await.unwrap();

    assert!(results.is_empty());
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_add_nothing_is_noop() {
    let embedder = Arc::new(KeywordEmbedder::default());
    let mut store = InMemoryVectorStore::new(embedder.clone());

    assert_eq!(store.add_documents(Vec::new()).await.unwrap(), 0);
    assert!(store.is_empty());
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_similarity_ordering() {
    let mut store = InMemoryVectorStore::new(Arc::new(KeywordEmbedder::default()));
    store
        .add_documents(vec![
            Document::new("cooking pasta"),
            Document::new("rust ownership and rust lifetimes"),
            Document::new("python and rust interop"),
        ])
        .await
        .unwrap();

    let results = store.similarity_search_with_score("rust", 2).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0.content, "rust ownership and rust lifetimes");
    assert!((results[0].1 - 1.0).abs() < 1e-6);
    assert!(results[0].1 >= results[1].1);
    assert_eq!(store.len(), 3);

    store.clear();
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_get_context_uses_only_relevant_chunks() {
    let mut store = InMemoryVectorStore::new(Arc::new(KeywordEmbedder::default()));
    store
        .add_documents(vec![
            Document::new("rust borrow checker"),
            Document::new("cooking risotto"),
        ])
        .await
        .unwrap();

    let retriever = Retriever::default();
    let context = retriever.get_context(&store, "rust", 1500).await.unwrap();

    assert_eq!(context, "rust borrow checker");
}

#[tokio::test]
async fn test_get_context_fallback_when_nothing_relevant() {
    let mut store = InMemoryVectorStore::new(Arc::new(KeywordEmbedder::default()));
    store
        .add_documents(vec![
            Document::new("cooking risotto"),
            Document::new("cooking soup"),
            Document::new("python scripts"),
        ])
        .await
        .unwrap();

    let docs = Retriever::new(0.3, 4).retrieve(&store, "rust", 4).await.unwrap();

    // All scores are zero, so the first k/2 candidates are kept.
    assert_eq!(docs.len(), 2);
}
