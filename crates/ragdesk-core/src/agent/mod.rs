//! Conversational RAG agent.
//!
//! Each turn retrieves context from the knowledge base, builds the system
//! prompt, and sends it with the trimmed conversation history to the model.

mod history;

pub use history::{trim_history, ChatMessage};

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::{
    Config, RagConfig, AGENT_SYSTEM_PROMPT, DEFAULT_SEARCH_K, EMPTY_KNOWLEDGE_BASE_CONTEXT, PREVIEW_CHARS,
};
use crate::llm::{LLMError, Message, Provider, Sampling, StreamChunk, LLM};
use crate::rag::{
    build_embedder, Document, DocumentProcessor, Embedder, EmbeddingError, InMemoryVectorStore, ProcessorError,
    Retriever,
};

/// Errors raised by the agent.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("API key is required. Set OPENAI_API_KEY (or the chat provider's key) or pass it explicitly.")]
    MissingApiKey,

    #[error(transparent)]
    LLM(#[from] LLMError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Processor(#[from] ProcessorError),
}

/// Summary of the knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KnowledgeBaseInfo {
    pub document_count: usize,
    pub has_documents: bool,
}

/// One document search result.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub content: String,
    pub metadata: BTreeMap<String, String>,
    pub preview: String,
    pub score: f32,
}

/// Chat agent backed by an in-memory knowledge base.
pub struct RagAgent {
    llm: Box<dyn LLM>,
    store: InMemoryVectorStore,
    retriever: Retriever,
    processor: DocumentProcessor,
    history: Vec<ChatMessage>,
    memory_window: usize,
    context_tokens: usize,
}

impl RagAgent {
    pub fn new(llm: Box<dyn LLM>, embedder: Arc<dyn Embedder>, rag: &RagConfig) -> Result<Self, AgentError> {
        Ok(Self {
            llm,
            store: InMemoryVectorStore::new(embedder),
            retriever: Retriever::new(rag.min_score, rag.retrieval_k),
            processor: DocumentProcessor::new(rag.chunk_size, rag.chunk_overlap)?,
            history: Vec::new(),
            memory_window: rag.memory_window,
            context_tokens: rag.context_tokens,
        })
    }

    /// Builds the model client and embedder described by `config`.
    ///
    /// `openai_api_key` overrides the configured OpenAI key. It is used by
    /// OpenAI-compatible chat providers and by the OpenAI embedder, never
    /// sent to other providers.
    pub fn from_config(config: &Config, openai_api_key: Option<String>) -> Result<Self, AgentError> {
        let openai_api_key = openai_api_key.filter(|k| !k.trim().is_empty());

        let llm_key = config.llm.resolve_api_key(openai_api_key.clone());
        if llm_key.is_none() && config.llm.provider != "ollama" {
            return Err(AgentError::MissingApiKey);
        }

        let embedding_key = match config.embedding.provider.as_str() {
            "openai" => {
                let key = openai_api_key.or_else(|| {
                    if config.llm.is_openai_compatible() {
                        llm_key.clone()
                    } else {
                        std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())
                    }
                });
                Some(key.ok_or(AgentError::MissingApiKey)?)
            }
            _ => None,
        };

        let mut llm_config = config.llm.clone();
        llm_config.api_key = llm_key;

        let llm = Provider::from_config(&llm_config)
            .build_with(Sampling::new(config.llm.max_tokens, config.llm.temperature))?;
        let embedder = build_embedder(&config.embedding, embedding_key)?;

        tracing::info!(
            provider = %config.llm.provider,
            model = %config.llm.model_or_default(),
            embeddings = %embedder.model_name(),
            "Agent ready"
        );

        Self::new(llm, embedder, &config.rag)
    }

    /// Answers `message`, recording the exchange on success.
    pub async fn chat(&mut self, message: &str) -> Result<String, AgentError> {
        let system = self.system_prompt(message).await?;
        let messages = self.outgoing_messages(message);

        let reply = self.llm.chat(Some(&system), &messages).await?;
        self.record_exchange(message, &reply);
        Ok(reply)
    }

    /// Like [`chat`](Self::chat), forwarding reply text through `tx` as it
    /// arrives. Returns the full reply.
    pub async fn chat_stream(
        &mut self,
        message: &str,
        tx: mpsc::UnboundedSender<StreamChunk>,
    ) -> Result<String, AgentError> {
        let system = self.system_prompt(message).await?;
        let messages = self.outgoing_messages(message);

        let (inner_tx, mut inner_rx) = mpsc::unbounded_channel::<StreamChunk>();

        let forward = async {
            let mut reply = String::new();
            while let Some(chunk) = inner_rx.recv().await {
                reply.push_str(&chunk.text);
                let _ = tx.send(chunk);
            }
            reply
        };

        let (result, reply) = tokio::join!(self.llm.stream_chat(Some(&system), &messages, inner_tx), forward);
        result?;

        self.record_exchange(message, &reply);
        Ok(reply)
    }

    /// Embeds `documents` into the knowledge base.
    pub async fn add_documents(&mut self, documents: Vec<Document>) -> Result<usize, AgentError> {
        let added = self.store.add_documents(documents).await?;
        tracing::info!(added, total = self.store.len(), "Added documents to knowledge base");
        Ok(added)
    }

    /// Loads, splits and indexes a file. Returns the number of chunks added.
    pub async fn ingest_file(&mut self, path: impl AsRef<Path>) -> Result<usize, AgentError> {
        let documents = self.processor.load_document(path)?;
        self.add_documents(documents).await
    }

    /// Splits and indexes uploaded file content.
    pub async fn ingest_bytes(&mut self, file_name: &str, bytes: &[u8]) -> Result<usize, AgentError> {
        let documents = self.processor.load_bytes(file_name, bytes)?;
        self.add_documents(documents).await
    }

    /// Splits and indexes raw text under `source`.
    pub async fn ingest_text(&mut self, text: &str, source: &str) -> Result<usize, AgentError> {
        let documents = self.processor.process_text_input(text, source);
        self.add_documents(documents).await
    }

    pub fn clear_knowledge_base(&mut self) {
        self.store.clear();
        tracing::info!("Knowledge base cleared");
    }

    pub fn knowledge_base_info(&self) -> KnowledgeBaseInfo {
        KnowledgeBaseInfo {
            document_count: self.store.len(),
            has_documents: !self.store.is_empty(),
        }
    }

    pub fn clear_conversation_history(&mut self) {
        self.history.clear();
    }

    pub fn conversation_history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Returns the `k` chunks most similar to `query`, unfiltered.
    pub async fn search_documents(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, AgentError> {
        let results = self.store.similarity_search_with_score(query, k).await?;

        Ok(results
            .into_iter()
            .map(|(doc, score)| SearchHit {
                preview: preview(&doc.content),
                content: doc.content,
                metadata: doc.metadata,
                score,
            })
            .collect())
    }

    /// [`search_documents`](Self::search_documents) with the default result count.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>, AgentError> {
        self.search_documents(query, DEFAULT_SEARCH_K).await
    }

    pub fn processor(&self) -> &DocumentProcessor {
        &self.processor
    }

    async fn system_prompt(&self, query: &str) -> Result<String, AgentError> {
        let context = if self.store.is_empty() {
            EMPTY_KNOWLEDGE_BASE_CONTEXT.to_string()
        } else {
            self.retriever
                .get_context(&self.store, query, self.context_tokens)
                .await?
        };

        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        // Time goes in first so document text is never re-substituted.
        Ok(AGENT_SYSTEM_PROMPT
            .replace("{current_time}", &now)
            .replace("{context}", &context))
    }

    fn outgoing_messages(&self, message: &str) -> Vec<Message> {
        let mut messages: Vec<Message> = trim_history(&self.history, self.memory_window)
            .iter()
            .map(ChatMessage::to_message)
            .collect();
        messages.push(Message::user(message));
        messages
    }

    fn record_exchange(&mut self, message: &str, reply: &str) {
        self.history.push(ChatMessage::user(message));
        self.history.push(ChatMessage::assistant(reply));
    }
}

fn preview(content: &str) -> String {
    if content.chars().count() > PREVIEW_CHARS {
        let head: String = content.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        content.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_short_content_unchanged() {
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn test_preview_truncates_long_content() {
        let content = "x".repeat(250);
        let p = preview(&content);
        assert_eq!(p.len(), PREVIEW_CHARS + 3);
        assert!(p.ends_with("..."));
    }
}
