use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ragdesk_core::agent::trim_history;
use ragdesk_core::config::{RagConfig, EMPTY_KNOWLEDGE_BASE_CONTEXT};
use ragdesk_core::llm::StreamChunk;
use ragdesk_core::rag::{Embedder, EmbeddingError};
use ragdesk_core::{AgentError, ChatMessage, Config, LLMError, Message, RagAgent, Role, LLM};
use tokio::sync::mpsc;

type Calls = Arc<Mutex<Vec<(String, Vec<Message>)>>>;

/// Records every request and answers "reply N".
#[derive(Clone, Default)]
struct MockLLM {
    calls: Calls,
    fail: Arc<AtomicBool>,
    drop_stream: Arc<AtomicBool>,
}

impl MockLLM {
    fn record(&self, system: Option<&str>, messages: &[Message]) -> Result<usize, LLMError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(LLMError::Network("connection refused".to_string()));
        }
        let mut calls = self.calls.lock().unwrap();
        calls.push((system.unwrap_or_default().to_string(), messages.to_vec()));
        Ok(calls.len())
    }

    fn last_call(&self) -> (String, Vec<Message>) {
        self.calls.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl LLM for MockLLM {
    async fn chat(&self, system: Option<&str>, messages: &[Message]) -> Result<String, LLMError> {
        let n = self.record(system, messages)?;
        Ok(format!("reply {}", n))
    }

    async fn stream_chat(
        &self,
        system: Option<&str>,
        messages: &[Message],
        tx: mpsc::UnboundedSender<StreamChunk>,
    ) -> Result<(), LLMError> {
        self.record(system, messages)?;
        for part in ["Hel", "lo", "!"] {
            let _ = tx.send(StreamChunk::text(part));
            if self.drop_stream.load(Ordering::SeqCst) {
                return Err(LLMError::Network("stream reset".to_string()));
            }
        }
        let _ = tx.send(StreamChunk::done());
        Ok(())
    }

    fn supports_streaming(&self) -> bool {
        true
    }
}

/// Letter-frequency vectors; enough to rank overlapping words higher.
struct LetterEmbedder;

#[async_trait]
impl Embedder for LetterEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts
            .iter()
            .map(|t| {
                let mut v = vec![0.0; 26];
                for c in t.to_ascii_lowercase().bytes().filter(u8::is_ascii_lowercase) {
                    v[(c - b'a') as usize] += 1.0;
                }
                v
            })
            .collect())
    }

    fn model_name(&self) -> &str {
        "letters"
    }
}

fn agent_with(llm: MockLLM, rag: RagConfig) -> RagAgent {
    RagAgent::new(Box::new(llm), Arc::new(LetterEmbedder), &rag).unwrap()
}

fn roles(messages: &[Message]) -> Vec<Role> {
    messages.iter().map(|m| m.role).collect()
}

#[tokio::test]
async fn test_chat_with_empty_knowledge_base() {
    let llm = MockLLM::default();
    let mut agent = agent_with(llm.clone(), RagConfig::default());

    let reply = agent.chat("Hello").await.unwrap();

    assert_eq!(reply, "reply 1");
    let (system, messages) = llm.last_call();
    assert!(system.contains(EMPTY_KNOWLEDGE_BASE_CONTEXT));
    assert!(system.contains("Current time: "));
    assert!(!system.contains("{current_time}"));
    assert_eq!(messages, vec![Message::user("Hello")]);

    let history = agent.conversation_history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[1].content, "reply 1");
}

#[tokio::test]
async fn test_history_is_trimmed_to_window() {
    let llm = MockLLM::default();
    let rag = RagConfig {
        memory_window: 2,
        ..RagConfig::default()
    };
    let mut agent = agent_with(llm.clone(), rag);

    agent.chat("one").await.unwrap();
    agent.chat("two").await.unwrap();
    agent.chat("three").await.unwrap();

    let (_, messages) = llm.last_call();
    assert_eq!(roles(&messages), vec![Role::User, Role::Assistant, Role::User]);
    assert_eq!(messages[0].content, "two");
    assert_eq!(messages[2].content, "three");
    assert_eq!(agent.conversation_history().len(), 6);
}

#[test]
fn test_trim_history_starts_with_user() {
    let history = vec![
        ChatMessage::assistant("a1"),
        ChatMessage::user("u1"),
        ChatMessage::assistant("a2"),
        ChatMessage::user("u2"),
        ChatMessage::assistant("a3"),
    ];

    let trimmed = trim_history(&history, 2);

    assert_eq!(trimmed.len(), 2);
    assert_eq!(trimmed[0].content, "u2");
    assert_eq!(trimmed[1].content, "a3");
}

#[tokio::test]
async fn test_failed_chat_leaves_history_unchanged() {
    let llm = MockLLM::default();
    let mut agent = agent_with(llm.clone(), RagConfig::default());
    agent.chat("first").await.unwrap();

    llm.fail.store(true, Ordering::SeqCst);
    let result = agent.chat("second").await;

    assert!(matches!(result, Err(AgentError::LLM(LLMError::Network(_)))));
    assert_eq!(agent.conversation_history().len(), 2);
}

#[tokio::test]
async fn test_context_comes_from_ingested_text() {
    let llm = MockLLM::default();
    let mut agent = agent_with(llm.clone(), RagConfig::default());

    let added = agent
        .ingest_text("The office wifi password is hunter2.", "manual_input")
        .await
        .unwrap();
    assert_eq!(added, 1);

    agent.chat("What is the wifi password?").await.unwrap();

    let (system, _) = llm.last_call();
    assert!(system.contains("The office wifi password is hunter2."));
    assert!(!system.contains(EMPTY_KNOWLEDGE_BASE_CONTEXT));
}

#[tokio::test]
async fn test_knowledge_base_info_and_clear() {
    let mut agent = agent_with(MockLLM::default(), RagConfig::default());
    assert!(!agent.knowledge_base_info().has_documents);

    agent.ingest_text("alpha", "a").await.unwrap();
    agent.ingest_text("beta", "b").await.unwrap();

    let info = agent.knowledge_base_info();
    assert_eq!(info.document_count, 2);
    assert!(info.has_documents);

    agent.clear_knowledge_base();
    assert_eq!(agent.knowledge_base_info().document_count, 0);
}

#[tokio::test]
async fn test_search_documents_preview() {
    let mut agent = agent_with(MockLLM::default(), RagConfig::default());
    let long = "abc ".repeat(100);
    agent.ingest_text(&long, "long.txt").await.unwrap();
    agent.ingest_text("xyz", "short.txt").await.unwrap();

    let hits = agent.search_documents("abc", 3).await.unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].metadata.get("source").map(String::as_str), Some("long.txt"));
    assert_eq!(hits[0].preview.chars().count(), 203);
    assert!(hits[0].preview.ends_with("..."));
    assert_eq!(hits[1].preview, "xyz");
}

#[tokio::test]
async fn test_search_empty_knowledge_base() {
    let agent = agent_with(MockLLM::default(), RagConfig::default());
    assert!(agent.search("anything").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_chat_stream_forwards_chunks() {
    let llm = MockLLM::default();
    let mut agent = agent_with(llm.clone(), RagConfig::default());
    let (tx, mut rx) = mpsc::unbounded_channel();

    let reply = agent.chat_stream("Hi", tx).await.unwrap();

    let mut streamed = String::new();
    let mut saw_final = false;
    while let Some(chunk) = rx.recv().await {
        streamed.push_str(&chunk.text);
        saw_final |= chunk.is_final;
    }

    assert_eq!(reply, "Hello!");
    assert_eq!(streamed, "Hello!");
    assert!(saw_final);
    assert_eq!(agent.conversation_history()[1].content, "Hello!");
}

#[tokio::test]
async fn test_chat_stream_failure_keeps_history() {
    let llm = MockLLM::default();
    let mut agent = agent_with(llm.clone(), RagConfig::default());
    agent.chat("first").await.unwrap();
    llm.drop_stream.store(true, Ordering::SeqCst);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let result = agent.chat_stream("second", tx).await;

    assert!(matches!(result, Err(AgentError::LLM(LLMError::Network(_)))));
    let mut delivered = Vec::new();
    while let Some(chunk) = rx.recv().await {
        delivered.push(chunk.text);
    }
    assert_eq!(delivered, vec!["Hel".to_string()]);

    let history = agent.conversation_history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].content, "first");
    assert_eq!(history[1].content, "reply 1");
}

#[tokio::test]
async fn test_clear_conversation_history() {
    let mut agent = agent_with(MockLLM::default(), RagConfig::default());
    agent.chat("hi").await.unwrap();

    agent.clear_conversation_history();
    assert!(agent.conversation_history().is_empty());
}

#[test]
fn test_from_config_requires_key() {
    std::env::remove_var("OPENAI_API_KEY");
    std::env::remove_var("RAGDESK_LLM_API_KEY");

    let result = RagAgent::from_config(&Config::default(), None);
    assert!(matches!(result, Err(AgentError::MissingApiKey)));
}

#[test]
fn test_from_config_with_explicit_key() {
    let agent = RagAgent::from_config(&Config::default(), Some("sk-test".to_string())).unwrap();
    assert!(agent.conversation_history().is_empty());
}

#[test]
fn test_openai_key_is_not_sent_to_anthropic() {
    std::env::remove_var("ANTHROPIC_API_KEY");
    std::env::remove_var("RAGDESK_LLM_API_KEY");

    let mut config = Config::default();
    config.llm.provider = "anthropic".to_string();

    let result = RagAgent::from_config(&config, Some("sk-openai".to_string()));
    assert!(matches!(result, Err(AgentError::MissingApiKey)));

    config.llm.api_key = Some("sk-ant".to_string());
    assert!(RagAgent::from_config(&config, Some("sk-openai".to_string())).is_ok());
}
