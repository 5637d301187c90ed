//! Assistant state behind the server: the agent plus the transcript shown
//! in the page.

use std::path::Path;

use ragdesk_core::config::DEFAULT_SEARCH_K;
use ragdesk_core::{RagAgent, SearchHit};

use super::models::ChatEntry;

/// Source recorded for text pasted into the page.
pub const MANUAL_INPUT_SOURCE: &str = "manual_input";

pub struct Session {
    agent: RagAgent,
    transcript: Vec<ChatEntry>,
}

impl Session {
    pub fn new(agent: RagAgent) -> Self {
        Self {
            agent,
            transcript: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn transcript(&self) -> &[ChatEntry] {
        &self.transcript
    }

    /// Sends `message` to the agent. Failures are shown as an assistant
    /// line starting with "Error: ". Blank messages are ignored.
    pub async fn chat(&mut self, message: &str) -> &[ChatEntry] {
        if message.trim().is_empty() {
            return &self.transcript;
        }

        let reply = match self.agent.chat(message).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "Chat request failed");
                format!("Error: {}", e)
            }
        };

        self.transcript.push(ChatEntry::user(message));
        self.transcript.push(ChatEntry::assistant(reply));
        &self.transcript
    }

    pub fn clear_chat(&mut self) -> String {
        self.agent.clear_conversation_history();
        self.transcript.clear();
        "Chat history cleared.".to_string()
    }

    pub fn status(&self) -> String {
        format!(
            "Documents in knowledge base: {}",
            self.agent.knowledge_base_info().document_count
        )
    }

    pub fn document_count(&self) -> usize {
        self.agent.knowledge_base_info().document_count
    }

    /// Indexes uploaded files in order, stopping at the first failure.
    pub async fn process_uploads(&mut self, files: Vec<(String, Vec<u8>)>) -> String {
        if files.is_empty() {
            return "No files uploaded.".to_string();
        }

        let mut total_chunks = 0;
        let mut processed = Vec::new();

        for (name, bytes) in files {
            let display_name = base_name(&name);
            match self.agent.ingest_bytes(&name, &bytes).await {
                Ok(added) => {
                    total_chunks += added;
                    processed.push(display_name);
                }
                Err(e) => {
                    tracing::warn!(file = %display_name, error = %e, "Upload failed");
                    return format!("Error processing {}: {}", display_name, e);
                }
            }
        }

        format!(
            "Successfully processed {} file(s): {}. Added {} document chunks to knowledge base.",
            processed.len(),
            processed.join(", "),
            total_chunks
        )
    }

    pub async fn add_text(&mut self, text: &str) -> String {
        if text.trim().is_empty() {
            return "No text provided.".to_string();
        }

        match self.agent.ingest_text(text, MANUAL_INPUT_SOURCE).await {
            Ok(chunks) => format!("Added text to knowledge base ({} chunks).", chunks),
            Err(e) => format!("Error adding text: {}", e),
        }
    }

    pub fn clear_knowledge_base(&mut self) -> String {
        self.agent.clear_knowledge_base();
        "Knowledge base cleared.".to_string()
    }

    /// Searches the knowledge base and formats the hits for display.
    pub async fn search(&self, query: &str) -> (String, Vec<SearchHit>) {
        if query.trim().is_empty() {
            return ("Please enter a search query.".to_string(), Vec::new());
        }

        let hits = match self.agent.search_documents(query, DEFAULT_SEARCH_K).await {
            Ok(hits) => hits,
            Err(e) => return (format!("Error searching documents: {}", e), Vec::new()),
        };

        if hits.is_empty() {
            return ("No relevant documents found.".to_string(), hits);
        }

        let mut output = format!("Found {} relevant document(s):\n\n", hits.len());
        for (i, hit) in hits.iter().enumerate() {
            let source = hit.metadata.get("source").map(String::as_str).unwrap_or("Unknown");
            output.push_str(&format!("**Result {}** (Source: {})\n", i + 1, base_name(source)));
            output.push_str(&format!("{}\n\n", hit.preview));
        }

        (output, hits)
    }
}

fn base_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string())
}
