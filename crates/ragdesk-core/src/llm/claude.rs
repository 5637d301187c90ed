use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::{drain_sse_events, push_sse_bytes, LLMError, Message, Role, StreamChunk, LLM};
use crate::config::{
    DEFAULT_ANTHROPIC_API_VERSION, DEFAULT_ANTHROPIC_MODEL, DEFAULT_ANTHROPIC_URL,
    DEFAULT_MAX_TOKENS,
};

/// Claude API client.
pub struct ClaudeClient {
    api_key: String,
    api_url: String,
    api_version: String,
    model: String,
    max_tokens: u32,
    temperature: Option<f32>,
    client: Client,
}

impl ClaudeClient {
    /// Creates a new Claude client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: DEFAULT_ANTHROPIC_URL.to_string(),
            api_version: DEFAULT_ANTHROPIC_API_VERSION.to_string(),
            model: DEFAULT_ANTHROPIC_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            client: Client::new(),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
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

    /// Sets the API URL (for proxies or enterprise deployments).
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Sets the API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    fn build_request(&self, system: Option<&str>, messages: &[Message], stream: bool) -> ClaudeRequest {
        // The messages API takes the system prompt as a top-level field.
        let messages = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| WireMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect();

        ClaudeRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: system.map(str::to_string),
            messages,
            temperature: self.temperature,
            stream: stream.then_some(true),
        }
    }

    async fn send(&self, request: &ClaudeRequest) -> Result<reqwest::Response, LLMError> {
        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await?;

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

    async fn send_request(&self, request: &ClaudeRequest) -> Result<String, LLMError> {
        let claude_response: ClaudeResponse = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        let text = claude_response
            .content
            .into_iter()
            .filter(|block| block.content_type == "text")
            .map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        Ok(text)
    }

    /// Send a streaming request and forward chunks through the channel.
    async fn send_streaming_request(
        &self,
        request: &ClaudeRequest,
        tx: mpsc::UnboundedSender<StreamChunk>,
    ) -> Result<(), LLMError> {
        let mut stream = self.send(request).await?.bytes_stream();
        let mut buffer = Vec::new();

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| LLMError::Network(e.to_string()))?;
            push_sse_bytes(&mut buffer, &chunk);

            for event in drain_sse_events(&mut buffer) {
                if let Some(text) = parse_claude_sse_event(&event) {
                    let _ = tx.send(StreamChunk::text(text));
                }
            }
        }

        let _ = tx.send(StreamChunk::done());
        Ok(())
    }
}

#[async_trait]
impl LLM for ClaudeClient {
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

#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<WireMessage>,
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
struct ClaudeResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

/// Parse a Claude SSE event and extract text from content_block_delta events.
///
/// Claude streaming format:
/// ```text
/// event: content_block_delta
/// data: {"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hello"}}
/// ```
fn parse_claude_sse_event(event_data: &str) -> Option<String> {
    let mut event_type = None;
    let mut data_line = None;

    for line in event_data.lines() {
        if let Some(stripped) = line.strip_prefix("event: ") {
            event_type = Some(stripped.trim());
        } else if let Some(stripped) = line.strip_prefix("data: ") {
            data_line = Some(stripped.trim());
        }
    }

    if event_type != Some("content_block_delta") {
        return None;
    }

    #[derive(Deserialize)]
    struct DeltaEvent {
        delta: Delta,
    }

    #[derive(Deserialize)]
    struct Delta {
        #[serde(default)]
        text: String,
    }

    let parsed: DeltaEvent = serde_json::from_str(data_line?).ok()?;

    if parsed.delta.text.is_empty() {
        None
    } else {
        Some(parsed.delta.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_is_top_level() {
        let client = ClaudeClient::new("key").with_model("claude-3-haiku");
        let request = client.build_request(Some("sys"), &[Message::user("hi")], false);

        assert_eq!(request.system.as_deref(), Some("sys"));
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, "user");
        assert_eq!(request.model, "claude-3-haiku");
    }

    #[test]
    fn test_parse_delta_event() {
        let event = "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hello\"}}";
        assert_eq!(parse_claude_sse_event(event), Some("Hello".to_string()));
    }

    #[test]
    fn test_ignores_other_events() {
        let event = "event: message_start\ndata: {\"type\":\"message_start\"}";
        assert_eq!(parse_claude_sse_event(event), None);
    }
}
