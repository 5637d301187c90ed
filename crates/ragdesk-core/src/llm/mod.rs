mod claude;
mod error;
mod openai;
mod provider;

pub use claude::ClaudeClient;
pub use error::LLMError;
pub use openai::OpenAIClient;
pub use provider::{Provider, Sampling};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// A chunk of streamed response from an LLM.
#[derive(Debug, Clone)]
pub struct StreamChunk {
    /// The text content of this chunk.
    pub text: String,
    /// Whether this is the final chunk.
    pub is_final: bool,
}

impl StreamChunk {
    /// Create a new text chunk.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    /// Create a final (end of stream) chunk.
    pub fn done() -> Self {
        Self {
            text: String::new(),
            is_final: true,
        }
    }
}

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One turn of a conversation as sent to a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Trait for Large Language Model providers.
///
/// This abstraction allows swapping between different LLM providers
/// without changing the rest of the code.
///
/// # Supported Providers
///
/// - **OpenAI-compatible** (default): Works with OpenAI, Azure, Ollama, vLLM, OpenRouter, etc.
/// - **Anthropic**: Claude models via Anthropic API
/// - **Ollama**: Local models via Ollama
///
/// # Example
///
/// ```ignore
/// use ragdesk_core::llm::{Message, Provider, LLM};
///
/// let llm = Provider::from_config(&config.llm).build()?;
/// let reply = llm.chat(Some("Be brief."), &[Message::user("Hello!")]).await?;
/// ```
#[async_trait]
pub trait LLM: Send + Sync {
    /// Send a conversation and return the assistant reply.
    ///
    /// `system` is sent ahead of `messages` in whatever form the provider expects.
    async fn chat(&self, system: Option<&str>, messages: &[Message]) -> Result<String, LLMError>;

    /// Complete a single prompt.
    async fn complete(&self, prompt: &str) -> Result<String, LLMError> {
        self.chat(None, &[Message::user(prompt)]).await
    }

    /// Complete a prompt with a system message.
    async fn complete_with_system(&self, system: &str, prompt: &str) -> Result<String, LLMError> {
        self.chat(Some(system), &[Message::user(prompt)]).await
    }

    /// Stream a conversation reply.
    ///
    /// Sends chunks through the provided channel as they arrive.
    /// The final chunk will have `is_final: true`.
    ///
    /// Default implementation falls back to non-streaming and sends
    /// the entire response as a single chunk.
    async fn stream_chat(
        &self,
        system: Option<&str>,
        messages: &[Message],
        tx: mpsc::UnboundedSender<StreamChunk>,
    ) -> Result<(), LLMError> {
        let response = self.chat(system, messages).await?;
        let _ = tx.send(StreamChunk::text(response));
        let _ = tx.send(StreamChunk::done());
        Ok(())
    }

    /// Returns true if this provider supports streaming.
    fn supports_streaming(&self) -> bool {
        false
    }
}

/// Blanket implementation for boxed trait objects.
#[async_trait]
impl LLM for Box<dyn LLM> {
    async fn chat(&self, system: Option<&str>, messages: &[Message]) -> Result<String, LLMError> {
        (**self).chat(system, messages).await
    }

    async fn stream_chat(
        &self,
        system: Option<&str>,
        messages: &[Message],
        tx: mpsc::UnboundedSender<StreamChunk>,
    ) -> Result<(), LLMError> {
        (**self).stream_chat(system, messages, tx).await
    }

    fn supports_streaming(&self) -> bool {
        (**self).supports_streaming()
    }
}

/// Appends a network read to the raw event buffer, dropping carriage returns.
pub(crate) fn push_sse_bytes(buffer: &mut Vec<u8>, bytes: &[u8]) {
    buffer.extend(bytes.iter().copied().filter(|&b| b != b'\r'));
}

/// Splits complete SSE events off the front of `buffer`.
///
/// Events are separated by a blank line; an incomplete tail stays in the
/// buffer as raw bytes, so a character split across reads is decoded whole.
pub(crate) fn drain_sse_events(buffer: &mut Vec<u8>) -> Vec<String> {
    let mut events = Vec::new();
    while let Some(pos) = buffer.windows(2).position(|w| w == b"\n\n") {
        events.push(String::from_utf8_lossy(&buffer[..pos]).into_owned());
        buffer.drain(..pos + 2);
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_sse_events_keeps_partial_tail() {
        let mut buffer = Vec::new();
        push_sse_bytes(&mut buffer, b"data: a\r\n\r\ndata: b\n\ndata: c");
        let events = drain_sse_events(&mut buffer);
        assert_eq!(events, vec!["data: a", "data: b"]);
        assert_eq!(buffer, b"data: c");
    }

    #[test]
    fn test_drain_sse_events_joins_split_character() {
        let event = "data: café\n\n".as_bytes();
        let split = event.iter().position(|&b| b == 0xC3).unwrap() + 1;

        let mut buffer = Vec::new();
        push_sse_bytes(&mut buffer, &event[..split]);
        assert!(drain_sse_events(&mut buffer).is_empty());

        push_sse_bytes(&mut buffer, &event[split..]);
        assert_eq!(drain_sse_events(&mut buffer), vec!["data: café"]);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }
}
