pub mod agent;
pub mod breakdown;
pub mod config;
pub mod llm;
pub mod manager;
pub mod rag;
pub mod storage;
pub mod task;

pub use agent::{AgentError, ChatMessage, KnowledgeBaseInfo, RagAgent, SearchHit};
pub use breakdown::{break_down_task, BreakdownError};
pub use config::{Config, ConfigError, LLMConfig};
pub use llm::{ClaudeClient, LLMError, Message, OpenAIClient, Provider, Role, LLM};
pub use manager::{LoadOutcome, ManagerError, TaskManager};
pub use rag::{Document, DocumentProcessor, Embedder, InMemoryVectorStore, Retriever};
pub use storage::{FileStorage, Storage, StorageError};
pub use task::Task;
