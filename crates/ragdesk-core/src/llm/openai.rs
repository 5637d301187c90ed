use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::{drain_sse_events, push_sse_bytes, LLMError, Message, Role, StreamChunk, LLM};
use crate::config::{DEFAULT_MAX_TOKENS, DEFAULT_OLLAMA_URL, DEFAULT_OPENAI_URL};

/// OpenAI-compatible API client.
///
/// Works with any provider that implements the OpenAI chat completions API:
/// - OpenAI
/// - Azure OpenAI
/// - Ollama (http://localhost:11434/v1)
/// - vLLM
/// - llama.cpp
/// - OpenRouter
pub struct OpenAIClient {
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: Option<f32>,
    client: Client,
}

impl OpenAIClient {
    /// Creates a new OpenAI-compatible client.
    ///
    /// # Arguments
    /// * `base_url` - The API base URL (e.g., "https://api.openai.com/v1")
    /// * `api_key` - The API key (can be empty for local providers like Ollama)
    /// * `model` - The model name (e.g., "gpt-4o", "llama3")
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            client: Client::new(),
        }
    }

    /// Creates a client for OpenAI.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new(DEFAULT_OPENAI_URL, api_key, model)
    }

    /// Creates a client for Ollama (local).
    pub fn ollama(model: impl Into<String>) -> Self {
        Self::new(DEFAULT_OLLAMA_URL, "", model)
    }

    /// Sets the maximum tokens for responses.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// The configured model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, system: Option<&str>, messages: &[Message], stream: bool) -> ChatRequest {
        let mut all_messages = Vec::with_capacity(messages.len() + 1);

        if let Some(sys) = system {
            all_messages.push(WireMessage {
                role: Role::System.as_str().to_string(),
                content: sys.to_string(),
            });
        }

        all_messages.extend(messages.iter().map(|m| WireMessage {
            role: m.role.as_str().to_string(),
            content: m.content.clone(),
        }));

        // Reasoning models reject `max_tokens` in favour of `max_completion_tokens`
        // and only accept their default temperature.
        let reasoning = uses_completion_tokens(&self.model);
        let (max_tokens, max_completion_tokens) = if reasoning {
            (None, Some(self.max_tokens))
        } else {
            (Some(self.max_tokens), None)
        };

        ChatRequest {
            model: self.model.clone(),
            messages: all_messages,
            max_tokens,
            max_completion_tokens,
            temperature: if reasoning { None } else { self.temperature },
            stream: stream.then_some(true),
        }
    }

    fn post(&self, request: &ChatRequest) -> RequestBuilder {
        let url = format!("{}/chat/completions", self.base_url);

        let mut req = self
            .client
            .post(&url)
            .header("content-type", "application/json");

        // Only add authorization if api_key is not empty
        if !self.api_key.is_empty() {
            req = req.header("authorization", format!("Bearer {}", self.api_key));
        }

        req.json(request)
    }

    async fn send_request(&self, request: &ChatRequest) -> Result<String, LLMError> {
        let response = check_status(self.post(request).send().await?).await?;

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        // Extract content from first choice
        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        Ok(content)
    }

    /// Send a streaming request and forward chunks through the channel.
    async fn send_streaming_request(
        &self,
        request: &ChatRequest,
        tx: mpsc::UnboundedSender<StreamChunk>,
    ) -> Result<(), LLMError> {
        let response = check_status(self.post(request).send().await?).await?;

        let mut stream = response.bytes_stream();
        let mut buffer = Vec::new();

        'outer: while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| LLMError::Network(e.to_string()))?;
            push_sse_bytes(&mut buffer, &chunk);

            for event in drain_sse_events(&mut buffer) {
                match parse_openai_sse_event(&event) {
                    SseEvent::Text(text) => {
                        let _ = tx.send(StreamChunk::text(text));
                    }
                    SseEvent::Done => break 'outer,
                    SseEvent::Skip => {}
                }
            }
        }

        let _ = tx.send(StreamChunk::done());
        Ok(())
    }
}

#[async_trait]
impl LLM for OpenAIClient {
    async fn chat(&self, system: Option<&str>, messages: &[Message]) -> Result<String, LLMError> {
        let request = self.build_request(system, messages, false);
        self.send_request(&request).await
    }

    async fn stream_chat(
        &self,
        system: Option<&str>,
        messages: &[Message],
        tx: mpsc::UnboundedSender<StreamChunk>,
    ) -> Result<(), LLMError> {
        let request = self.build_request(system, messages, true);
        self.send_streaming_request(&request, tx).await
    }

    fn supports_streaming(&self) -> bool {
        true
    }
}

/// Maps rate limits and non-2xx statuses to errors.
async fn check_status(response: Response) -> Result<Response, LLMError> {
    let status = response.status();

    if status == 429 {
        return Err(LLMError::RateLimited);
    }

    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(LLMError::ApiError {
            status: status.as_u16(),
            message: error_text,
        });
    }

    Ok(response)
}

fn uses_completion_tokens(model: &str) -> bool {
    ["gpt-5", "o1", "o3", "o4"]
        .iter()
        .any(|prefix| model.starts_with(prefix))
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum SseEvent {
    Text(String),
    Done,
    Skip,
}

/// Parse an OpenAI SSE event.
///
/// OpenAI streaming format:
/// ```text
/// data: {"choices":[{"index":0,"delta":{"content":"Hello"}}]}
///
/// data: [DONE]
/// ```
fn parse_openai_sse_event(event_data: &str) -> SseEvent {
    #[derive(Deserialize)]
    struct StreamEvent {
        #[serde(default)]
        choices: Vec<StreamChoice>,
    }

    #[derive(Deserialize)]
    struct StreamChoice {
        #[serde(default)]
        delta: Delta,
    }

    #[derive(Default, Deserialize)]
    struct Delta {
        #[serde(default)]
        content: Option<String>,
    }

    let mut text = String::new();

    for line in event_data.lines() {
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();

        if data == "[DONE]" {
            return SseEvent::Done;
        }

        if let Ok(parsed) = serde_json::from_str::<StreamEvent>(data) {
            for choice in parsed.choices {
                if let Some(content) = choice.delta.content {
                    text.push_str(&content);
                }
            }
        }
    }

    if text.is_empty() {
        SseEvent::Skip
    } else {
        SseEvent::Text(text)
    }
}
