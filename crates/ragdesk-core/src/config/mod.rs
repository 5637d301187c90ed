//! Configuration management for ragdesk.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. Project-local `ragdesk.toml` file
//! 3. User config `~/.config/ragdesk/config.toml`
//! 4. Built-in defaults (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

mod defaults;

pub use defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chat model configuration.
    pub llm: LLMConfig,

    /// Embedding model configuration.
    pub embedding: EmbeddingConfig,

    /// Chunking, retrieval and memory settings.
    pub rag: RagConfig,

    /// Assistant server settings.
    pub server: ServerConfig,

    /// Task manager settings.
    pub tasks: TasksConfig,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Searches for config in order:
    /// 1. `./ragdesk.toml` (project local)
    /// 2. `~/.config/ragdesk/config.toml` (user config)
    /// 3. Falls back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        if Path::new("ragdesk.toml").exists() {
            return Self::from_file("ragdesk.toml");
        }

        if let Some(user_config) = Self::user_config_path() {
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Path of the per-user config file, if a config dir exists.
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ragdesk").join("config.toml"))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(provider) = std::env::var("RAGDESK_LLM_PROVIDER") {
            self.llm.provider = provider;
        }
        if let Ok(model) = std::env::var("RAGDESK_LLM_MODEL") {
            self.llm.model = Some(model);
        }
        if let Ok(url) = std::env::var("RAGDESK_LLM_BASE_URL") {
            self.llm.base_url = Some(url);
        }
        if let Ok(key) = std::env::var("RAGDESK_LLM_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Ok(tokens) = std::env::var("RAGDESK_LLM_MAX_TOKENS") {
            if let Ok(n) = tokens.parse() {
                self.llm.max_tokens = n;
            }
        }
        if let Ok(temp) = std::env::var("RAGDESK_LLM_TEMPERATURE") {
            if let Ok(t) = temp.parse() {
                self.llm.temperature = t;
            }
        }

        if let Ok(provider) = std::env::var("RAGDESK_EMBEDDING_PROVIDER") {
            self.embedding.provider = provider;
        }
        if let Ok(model) = std::env::var("RAGDESK_EMBEDDING_MODEL") {
            self.embedding.model = model;
        }

        if let Ok(window) = std::env::var("RAGDESK_MEMORY_WINDOW") {
            if let Ok(n) = window.parse() {
                self.rag.memory_window = n;
            }
        }
        if let Ok(score) = std::env::var("RAGDESK_MIN_SCORE") {
            if let Ok(s) = score.parse() {
                self.rag.min_score = s;
            }
        }

        if let Ok(port) = std::env::var("PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }

        if let Ok(file) = std::env::var("RAGDESK_TASKS_FILE") {
            self.tasks.default_file = file;
        }
        if let Ok(model) = std::env::var("RAGDESK_BREAKDOWN_MODEL") {
            self.tasks.breakdown_model = Some(model);
        }
    }

    /// Reject settings the splitter or retriever cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rag.chunk_size == 0 {
            return Err(ConfigError::Invalid("rag.chunk_size must be > 0".into()));
        }
        if self.rag.chunk_overlap >= self.rag.chunk_size {
            return Err(ConfigError::Invalid(format!(
                "rag.chunk_overlap ({}) must be smaller than rag.chunk_size ({})",
                self.rag.chunk_overlap, self.rag.chunk_size
            )));
        }
        Ok(())
    }
}

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LLMConfig {
    /// Provider name: "openai", "anthropic" or "ollama".
    pub provider: String,

    /// Model name (provider-specific).
    pub model: Option<String>,

    /// Base URL for API (for openai-compatible providers).
    pub base_url: Option<String>,

    /// API key (can also be set via environment variable).
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Maximum tokens for response.
    pub max_tokens: u32,

    /// Sampling temperature.
    pub temperature: f32,

    /// API version (for Anthropic).
    pub api_version: Option<String>,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_LLM_PROVIDER.to_string(),
            model: None,
            base_url: None,
            api_key: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            api_version: Some(DEFAULT_ANTHROPIC_API_VERSION.to_string()),
        }
    }
}

impl LLMConfig {
    /// Get the model name, falling back to provider defaults.
    pub fn model_or_default(&self) -> String {
        self.model.clone().unwrap_or_else(|| match self.provider.as_str() {
            "anthropic" | "claude" => DEFAULT_ANTHROPIC_MODEL.to_string(),
            "ollama" => DEFAULT_OLLAMA_MODEL.to_string(),
            _ => DEFAULT_OPENAI_MODEL.to_string(),
        })
    }

    /// Whether the provider speaks the OpenAI chat completions API with an
    /// OpenAI key.
    pub fn is_openai_compatible(&self) -> bool {
        !matches!(self.provider.as_str(), "anthropic" | "claude" | "ollama")
    }

    /// Key for the chat client. `openai_override` only applies to
    /// OpenAI-compatible providers.
    pub fn resolve_api_key(&self, openai_override: Option<String>) -> Option<String> {
        let override_key = openai_override
            .filter(|k| !k.trim().is_empty())
            .filter(|_| self.is_openai_compatible());
        override_key.or_else(|| self.api_key_or_env())
    }

    /// Get API key from config or environment.
    pub fn api_key_or_env(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("RAGDESK_LLM_API_KEY").ok())
            .or_else(|| match self.provider.as_str() {
                "anthropic" | "claude" => std::env::var("ANTHROPIC_API_KEY").ok(),
                _ => std::env::var("OPENAI_API_KEY").ok(),
            })
            .filter(|k| !k.trim().is_empty())
    }
}

/// Embedding provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// "openai" for the remote embeddings endpoint, "fastembed" for a local model.
    pub provider: String,

    /// Remote embedding model name (ignored by fastembed).
    pub model: String,

    /// Base URL of the embeddings endpoint.
    pub base_url: Option<String>,

    /// Cache directory for local models. Defaults to `~/.ragdesk/cache`.
    pub cache_dir: Option<PathBuf>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_EMBEDDING_PROVIDER.to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            base_url: None,
            cache_dir: None,
        }
    }
}

/// Chunking, retrieval and memory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub min_score: f32,
    pub retrieval_k: usize,
    pub context_tokens: usize,
    pub memory_window: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            min_score: DEFAULT_MIN_SCORE,
            retrieval_k: DEFAULT_RETRIEVAL_K,
            context_tokens: DEFAULT_CONTEXT_TOKENS,
            memory_window: DEFAULT_MEMORY_WINDOW,
        }
    }
}

/// Assistant server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub title: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

/// Task manager settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TasksConfig {
    /// File offered when the user presses enter at the filename prompt.
    pub default_file: String,

    /// Model used for task breakdown. Unset means [`BREAKDOWN_MODEL`] on
    /// OpenAI-compatible providers and the chat model elsewhere.
    pub breakdown_model: Option<String>,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            default_file: DEFAULT_TASKS_FILE.to_string(),
            breakdown_model: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.provider, DEFAULT_LLM_PROVIDER);
        assert_eq!(config.rag.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[llm]"));
        assert!(toml_str.contains("[rag]"));
        assert!(toml_str.contains("[server]"));
        assert!(!toml_str.contains("api_key"));
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        let mut config = Config::default();
        config.rag.chunk_overlap = config.rag.chunk_size;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
