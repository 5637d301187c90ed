//! Embedding generation for semantic search.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error::EmbeddingError;
use crate::config::{EmbeddingConfig, DEFAULT_EMBEDDING_MODEL, DEFAULT_OPENAI_URL};

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embeddings for a batch of text, one vector per input.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a single query string.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        if vectors.len() != 1 {
            return Err(EmbeddingError::CountMismatch {
                expected: 1,
                actual: vectors.len(),
            });
        }
        Ok(vectors.remove(0))
    }

    /// Get the model name.
    fn model_name(&self) -> &str;
}

/// Builds the embedder selected by `config`.
///
/// `api_key` is only needed by the OpenAI backend.
pub fn build_embedder(
    config: &EmbeddingConfig,
    api_key: Option<String>,
) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    match config.provider.as_str() {
        "openai" => {
            let key = api_key.ok_or(EmbeddingError::MissingApiKey)?;
            let base = config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string());
            Ok(Arc::new(OpenAIEmbedder::new(base, key, config.model.clone())))
        }
        "fastembed" | "local" => {
            let cache_dir = config
                .cache_dir
                .clone()
                .unwrap_or_else(FastEmbedder::default_cache_dir);
            Ok(Arc::new(FastEmbedder::with_model_and_cache(
                EmbeddingModel::BGESmallENV15,
                cache_dir,
            )?))
        }
        other => Err(EmbeddingError::UnknownProvider(other.to_string())),
    }
}

/// Client for an OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAIEmbedder {
    api_key: String,
    base_url: String,
    model: String,
    client: Client,
}

impl OpenAIEmbedder {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client: Client::new(),
        }
    }

    /// OpenAI with the default embedding model.
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new(DEFAULT_OPENAI_URL, api_key, DEFAULT_EMBEDDING_MODEL)
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let mut req = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("content-type", "application/json");

        if !self.api_key.is_empty() {
            req = req.header("authorization", format!("Bearer {}", self.api_key));
        }

        let response = req.json(&request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Request(e.to_string()))?;

        let mut data = body.data;
        data.sort_by_key(|d| d.index);

        if data.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: data.len(),
            });
        }

        tracing::debug!(count = data.len(), model = %self.model, "Embedded batch");
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

/// FastEmbed-based embedder using a local BGE-Small model.
pub struct FastEmbedder {
    model: TextEmbedding,
    model_name: String,
}

impl FastEmbedder {
    /// Create a new FastEmbed embedder with the default model.
    /// Uses `~/.ragdesk/cache/` as the model cache directory.
    pub fn new() -> Result<Self, EmbeddingError> {
        Self::with_model_and_cache(EmbeddingModel::BGESmallENV15, Self::default_cache_dir())
    }

    /// Create a new FastEmbed embedder with a specific model and cache directory.
    pub fn with_model_and_cache(model: EmbeddingModel, cache_dir: PathBuf) -> Result<Self, EmbeddingError> {
        let model_name = format!("{:?}", model);

        std::fs::create_dir_all(&cache_dir).map_err(|e| {
            EmbeddingError::Model(format!("Failed to create cache directory: {}", e))
        })?;

        tracing::info!(model = %model_name, cache = %cache_dir.display(), "Loading local embedding model");

        let text_embedding = TextEmbedding::try_new(
            InitOptions::new(model)
                .with_cache_dir(cache_dir)
                .with_show_download_progress(true),
        )
        .map_err(|e| EmbeddingError::Model(e.to_string()))?;

        Ok(Self {
            model: text_embedding,
            model_name,
        })
    }

    /// Get the default cache directory: `~/.ragdesk/cache/`
    pub fn default_cache_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ragdesk")
            .join("cache")
    }
}

#[async_trait]
impl Embedder for FastEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let texts_vec: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();

        self.model
            .embed(texts_vec, None)
            .map_err(|e| EmbeddingError::Model(e.to_string()))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_embedder_trims_url() {
        let embedder = OpenAIEmbedder::new("https://api.example.com/v1/", "k", "m");
        assert_eq!(embedder.base_url, "https://api.example.com/v1");
        assert_eq!(embedder.model_name(), "m");
    }

    #[test]
    fn test_openai_requires_key() {
        let config = EmbeddingConfig::default();
        assert!(matches!(
            build_embedder(&config, None),
            Err(EmbeddingError::MissingApiKey)
        ));
    }

    #[test]
    fn test_unknown_provider() {
        let config = EmbeddingConfig {
            provider: "word2vec".to_string(),
            ..EmbeddingConfig::default()
        };
        assert!(matches!(
            build_embedder(&config, Some("k".into())),
            Err(EmbeddingError::UnknownProvider(p)) if p == "word2vec"
        ));
    }

    #[tokio::test]
    async fn test_fastembed_dimension() {
        // This test requires downloading the model, so we skip it in CI
        if std::env::var("CI").is_ok() || std::env::var("RAGDESK_OFFLINE").is_ok() {
            return;
        }

        let Ok(embedder) = FastEmbedder::new() else {
            return;
        };
        let vector = embedder.embed_query("test").await.unwrap();
        assert_eq!(vector.len(), 384); // BGE-Small produces 384-dim vectors
    }
}
