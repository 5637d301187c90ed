//! Default values for ragdesk configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// LLM Defaults
// ============================================================================

/// Default LLM provider.
pub const DEFAULT_LLM_PROVIDER: &str = "openai";

/// Default max tokens for chat responses.
pub const DEFAULT_MAX_TOKENS: u32 = 4000;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

// OpenAI defaults
/// Default OpenAI API URL.
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
/// Default OpenAI chat model.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-5";

// Anthropic defaults
/// Default Anthropic API URL.
pub const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
/// Default Anthropic model.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
/// Default Anthropic API version.
pub const DEFAULT_ANTHROPIC_API_VERSION: &str = "2023-06-01";

// Ollama defaults
/// Default Ollama API URL.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434/v1";
/// Default Ollama model.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";

// ============================================================================
// Embedding Defaults
// ============================================================================

/// Default embedding provider ("openai" or "fastembed").
pub const DEFAULT_EMBEDDING_PROVIDER: &str = "openai";

/// Default OpenAI embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

// ============================================================================
// RAG Defaults
// ============================================================================

/// Maximum characters per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Characters shared between consecutive chunks.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Minimum cosine similarity for a retrieved chunk to count as relevant.
pub const DEFAULT_MIN_SCORE: f32 = 0.3;

/// Number of candidates fetched by the retriever.
pub const DEFAULT_RETRIEVAL_K: usize = 4;

/// Number of results returned by a document search.
pub const DEFAULT_SEARCH_K: usize = 3;

/// Approximate token budget for the context injected into the system prompt.
pub const DEFAULT_CONTEXT_TOKENS: usize = 1500;

/// Number of most recent messages kept as conversation memory.
pub const DEFAULT_MEMORY_WINDOW: usize = 10;

/// Characters per token used for budget estimation.
pub const CHARS_PER_TOKEN: usize = 4;

/// Separator placed between chunks in an assembled context.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Length of the preview shown for search results.
pub const PREVIEW_CHARS: usize = 200;

/// Context used when the knowledge base holds no documents.
pub const EMPTY_KNOWLEDGE_BASE_CONTEXT: &str = "No documents available in the knowledge base.";

// ============================================================================
// Server Defaults
// ============================================================================

/// Default bind host for the assistant server.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default port for the assistant server.
pub const DEFAULT_PORT: u16 = 7860;

/// Title shown on the assistant page.
pub const DEFAULT_TITLE: &str = "RAG AI Assistant";

// ============================================================================
// Task Defaults
// ============================================================================

/// Default file used by the task manager when none is given.
pub const DEFAULT_TASKS_FILE: &str = "tasks.json";

/// Model for the task breakdown call on OpenAI-compatible providers.
pub const BREAKDOWN_MODEL: &str = "gpt-3.5-turbo";

/// Max tokens for the task breakdown call.
pub const BREAKDOWN_MAX_TOKENS: u32 = 500;

/// Temperature for the task breakdown call.
pub const BREAKDOWN_TEMPERATURE: f32 = 0.7;

// ============================================================================
// System Prompts
// ============================================================================

/// System prompt for the task breakdown helper.
pub const BREAKDOWN_SYSTEM_PROMPT: &str =
    "You are an expert task manager. Break down the following task into simple, manageable tasks.";

/// System prompt template for the RAG agent.
///
/// `{context}` and `{current_time}` are substituted on every turn.
pub const AGENT_SYSTEM_PROMPT: &str = r#"You are a helpful AI assistant with access to a knowledge base of documents.
You can answer questions using both your general knowledge and information from the provided documents.

When answering questions:
1. If relevant information is available in the provided context, prioritize it
2. Clearly indicate when you're using information from the documents vs. your general knowledge
3. Be concise but thorough in your responses
4. If you cannot find relevant information in the documents, say so and provide what help you can from your general knowledge
5. Always be helpful, accurate, and honest about the limitations of your knowledge

Context from documents:
{context}

Current time: {current_time}"#;
