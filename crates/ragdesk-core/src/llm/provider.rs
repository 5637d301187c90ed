use super::{ClaudeClient, LLMError, OpenAIClient, LLM};
use crate::config::{
    LLMConfig, DEFAULT_ANTHROPIC_MODEL, DEFAULT_MAX_TOKENS, DEFAULT_OLLAMA_MODEL,
    DEFAULT_OLLAMA_URL, DEFAULT_OPENAI_MODEL, DEFAULT_OPENAI_URL,
};

/// Generation settings applied to a built client.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
        }
    }
}

impl Sampling {
    pub fn new(max_tokens: u32, temperature: f32) -> Self {
        Self {
            max_tokens,
            temperature: Some(temperature),
        }
    }
}

/// LLM Provider configuration.
#[derive(Debug, Clone)]
pub enum Provider {
    /// OpenAI-compatible endpoint (default, most universal)
    OpenAI {
        base_url: Option<String>,
        api_key: Option<String>,
        model: Option<String>,
    },
    /// Anthropic Claude
    Anthropic {
        /// Either the API root (`.../v1`) or the full messages URL.
        base_url: Option<String>,
        api_key: Option<String>,
        model: Option<String>,
        api_version: Option<String>,
    },
    /// Local Ollama instance
    Ollama {
        base_url: Option<String>,
        model: String,
    },
}

impl Default for Provider {
    fn default() -> Self {
        Provider::OpenAI {
            base_url: None,
            api_key: None,
            model: None,
        }
    }
}

impl Provider {
    /// Creates a provider from LLMConfig.
    pub fn from_config(config: &LLMConfig) -> Self {
        match config.provider.as_str() {
            "anthropic" | "claude" => Provider::Anthropic {
                base_url: config.base_url.clone(),
                api_key: config.api_key.clone(),
                model: config.model.clone(),
                api_version: config.api_version.clone(),
            },
            "ollama" => Provider::Ollama {
                base_url: config.base_url.clone(),
                model: config
                    .model
                    .clone()
                    .unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
            },
            _ => Provider::OpenAI {
                base_url: config.base_url.clone(),
                api_key: config.api_key.clone(),
                model: config.model.clone(),
            },
        }
    }

    /// Creates an LLM client with default sampling.
    pub fn build(self) -> Result<Box<dyn LLM>, LLMError> {
        self.build_with(Sampling::default())
    }

    /// Creates an LLM client from the provider configuration.
    pub fn build_with(self, sampling: Sampling) -> Result<Box<dyn LLM>, LLMError> {
        match self {
            Provider::OpenAI {
                base_url,
                api_key,
                model,
            } => {
                let base = base_url
                    .or_else(|| std::env::var("RAGDESK_LLM_BASE_URL").ok())
                    .or_else(|| std::env::var("OPENAI_BASE_URL").ok())
                    .unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string());

                let key = api_key
                    .or_else(|| std::env::var("RAGDESK_LLM_API_KEY").ok())
                    .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                    .unwrap_or_default();

                let mdl = model
                    .or_else(|| std::env::var("RAGDESK_LLM_MODEL").ok())
                    .or_else(|| std::env::var("OPENAI_MODEL").ok())
                    .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());

                let mut client = OpenAIClient::new(base, key, mdl).with_max_tokens(sampling.max_tokens);
                if let Some(t) = sampling.temperature {
                    client = client.with_temperature(t);
                }
                Ok(Box::new(client))
            }

            Provider::Anthropic {
                base_url,
                api_key,
                model,
                api_version,
            } => {
                let key = api_key
                    .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
                    .ok_or(LLMError::MissingApiKey)?;

                let mdl = model
                    .or_else(|| std::env::var("ANTHROPIC_MODEL").ok())
                    .unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string());

                let mut client = ClaudeClient::new(key)
                    .with_model(mdl)
                    .with_max_tokens(sampling.max_tokens);
                if let Some(base) = base_url {
                    client = client.with_api_url(messages_url(&base));
                }
                if let Some(version) = api_version {
                    client = client.with_api_version(version);
                }
                if let Some(t) = sampling.temperature {
                    client = client.with_temperature(t);
                }
                Ok(Box::new(client))
            }

            Provider::Ollama { base_url, model } => {
                let base = base_url
                    .or_else(|| std::env::var("OLLAMA_HOST").ok().map(|h| format!("{}/v1", h.trim_end_matches('/'))))
                    .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());

                let mut client = OpenAIClient::new(base, "", model).with_max_tokens(sampling.max_tokens);
                if let Some(t) = sampling.temperature {
                    client = client.with_temperature(t);
                }
                Ok(Box::new(client))
            }
        }
    }
}

/// Resolves a configured Anthropic base URL to the messages endpoint.
fn messages_url(base: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.ends_with("/messages") {
        base.to_string()
    } else {
        format!("{}/messages", base)
    }
}
