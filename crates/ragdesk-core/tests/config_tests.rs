use ragdesk_core::config::{
    DEFAULT_ANTHROPIC_MODEL, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_CONTEXT_TOKENS,
    DEFAULT_LLM_PROVIDER, DEFAULT_MEMORY_WINDOW, DEFAULT_MIN_SCORE, DEFAULT_OLLAMA_MODEL,
    DEFAULT_OPENAI_MODEL, DEFAULT_PORT,
};
use ragdesk_core::{Config, ConfigError, LLMConfig};
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.llm.provider, DEFAULT_LLM_PROVIDER);
    assert_eq!(config.llm.max_tokens, 4000);
    assert!((config.llm.temperature - 0.7).abs() < f32::EPSILON);
    assert_eq!(config.rag.chunk_size, DEFAULT_CHUNK_SIZE);
    assert_eq!(config.rag.chunk_overlap, DEFAULT_CHUNK_OVERLAP);
    assert_eq!(config.rag.memory_window, DEFAULT_MEMORY_WINDOW);
    assert_eq!(config.rag.context_tokens, DEFAULT_CONTEXT_TOKENS);
    assert_eq!(config.rag.min_score, DEFAULT_MIN_SCORE);
    assert_eq!(config.server.port, DEFAULT_PORT);
    assert_eq!(config.tasks.default_file, "tasks.json");
}

#[test]
fn test_config_from_toml() {
    let toml_str = r#"
[llm]
provider = "ollama"
model = "llama3"

[rag]
chunk_size = 500
chunk_overlap = 50
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.llm.provider, "ollama");
    assert_eq!(config.llm.model, Some("llama3".to_string()));
    assert_eq!(config.rag.chunk_size, 500);
    assert_eq!(config.rag.chunk_overlap, 50);
    // Untouched sections keep their defaults
    assert_eq!(config.rag.memory_window, DEFAULT_MEMORY_WINDOW);
    assert_eq!(config.server.port, DEFAULT_PORT);
}

#[test]
fn test_from_file_rejects_bad_chunking() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ragdesk.toml");
    std::fs::write(&path, "[rag]\nchunk_size = 100\nchunk_overlap = 100\n").unwrap();

    let result = Config::from_file(&path);
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_from_file_parse_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ragdesk.toml");
    std::fs::write(&path, "[rag\nchunk_size = ").unwrap();

    assert!(matches!(Config::from_file(&path), Err(ConfigError::ParseError(_))));
}

#[test]
fn test_default_config_round_trips_through_toml() {
    let rendered = toml::to_string_pretty(&Config::default()).unwrap();
    let parsed: Config = toml::from_str(&rendered).unwrap();
    assert_eq!(parsed.rag.chunk_size, DEFAULT_CHUNK_SIZE);
}

#[test]
fn test_model_or_default() {
    let mut config = LLMConfig {
        provider: "anthropic".to_string(),
        ..Default::default()
    };
    assert_eq!(config.model_or_default(), DEFAULT_ANTHROPIC_MODEL);

    config.provider = "ollama".to_string();
    assert_eq!(config.model_or_default(), DEFAULT_OLLAMA_MODEL);

    config.provider = "openai".to_string();
    assert_eq!(config.model_or_default(), DEFAULT_OPENAI_MODEL);

    config.model = Some("custom-model".to_string());
    assert_eq!(config.model_or_default(), "custom-model");
}

#[test]
fn test_explicit_api_key_wins() {
    let config = LLMConfig {
        api_key: Some("sk-test".to_string()),
        ..Default::default()
    };
    assert_eq!(config.api_key_or_env(), Some("sk-test".to_string()));
}

#[test]
fn test_openai_override_only_for_compatible_providers() {
    let mut config = LLMConfig {
        provider: "anthropic".to_string(),
        api_key: Some("sk-ant".to_string()),
        ..Default::default()
    };
    assert!(!config.is_openai_compatible());
    assert_eq!(config.resolve_api_key(Some("sk-openai".to_string())).as_deref(), Some("sk-ant"));

    config.provider = "openai".to_string();
    config.api_key = None;
    assert!(config.is_openai_compatible());
    assert_eq!(config.resolve_api_key(Some("sk-openai".to_string())).as_deref(), Some("sk-openai"));
}
