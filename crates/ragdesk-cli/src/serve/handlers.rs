//! HTTP route handlers for the assistant server.
//!
//! Handlers are kept thin, delegating to [`Session`](super::session::Session).

use std::sync::Arc;

use axum::{
    extract::{Multipart, Query, State},
    response::Html,
    Json,
};

use super::models::{
    ChatRequest, ChatResponse, KnowledgeBaseStatus, SearchQuery, SearchResponse, StatusResponse, TextRequest,
};
use super::templates;
use super::AppState;

// =============================================================================
// Page Handlers
// =============================================================================

/// GET `/` - Chat and document management page.
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(templates::render_page(&state.title))
}

// =============================================================================
// Chat Handlers
// =============================================================================

/// POST `/api/chat` - Send a message and return the updated conversation.
pub async fn chat(State(state): State<Arc<AppState>>, Json(request): Json<ChatRequest>) -> Json<ChatResponse> {
    let mut session = state.session.lock().await;
    let history = session.chat(&request.message).await.to_vec();
    Json(ChatResponse { history, status: None })
}

/// POST `/api/chat/clear` - Forget the conversation.
pub async fn clear_chat(State(state): State<Arc<AppState>>) -> Json<ChatResponse> {
    let mut session = state.session.lock().await;
    let status = session.clear_chat();
    Json(ChatResponse {
        history: Vec::new(),
        status: Some(status),
    })
}

/// GET `/api/status` - Knowledge base size.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<KnowledgeBaseStatus> {
    let session = state.session.lock().await;
    let document_count = session.document_count();
    Json(KnowledgeBaseStatus {
        status: session.status(),
        document_count,
        has_documents: document_count > 0,
    })
}

// =============================================================================
// Document Handlers
// =============================================================================

/// POST `/api/documents/upload` - Multipart upload of one or more files.
pub async fn upload(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Json<StatusResponse> {
    let mut files = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Json(StatusResponse::new(format!("Error reading upload: {}", e))),
        };

        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }

        match field.bytes().await {
            Ok(bytes) => files.push((name, bytes.to_vec())),
            Err(e) => return Json(StatusResponse::new(format!("Error processing {}: {}", name, e))),
        }
    }

    let mut session = state.session.lock().await;
    Json(StatusResponse::new(session.process_uploads(files).await))
}

/// POST `/api/documents/text` - Add pasted text.
pub async fn add_text(State(state): State<Arc<AppState>>, Json(request): Json<TextRequest>) -> Json<StatusResponse> {
    let mut session = state.session.lock().await;
    Json(StatusResponse::new(session.add_text(&request.text).await))
}

/// GET `/api/documents/search` - Similarity search over the knowledge base.
///
/// Query parameters:
/// - `q`: Search query string
pub async fn search(State(state): State<Arc<AppState>>, Query(params): Query<SearchQuery>) -> Json<SearchResponse> {
    let session = state.session.lock().await;
    let (status, results) = session.search(&params.q).await;
    Json(SearchResponse { status, results })
}

/// POST `/api/documents/clear` - Remove every document.
pub async fn clear_documents(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let mut session = state.session.lock().await;
    Json(StatusResponse::new(session.clear_knowledge_base()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serve::session::tests::session;
    use tokio::sync::Mutex;

    fn state() -> Arc<AppState> {
        let (session, _) = session();
        Arc::new(AppState {
            session: Mutex::new(session),
            title: "Test Assistant".to_string(),
        })
    }

    #[tokio::test]
    async fn test_index_contains_title() {
        let Html(page) = index(State(state())).await;
        assert!(page.contains("Test Assistant"));
        assert!(page.contains("Document Management"));
    }

    #[tokio::test]
    async fn test_chat_then_clear() {
        let state = state();

        let Json(response) = chat(
            State(state.clone()),
            Json(ChatRequest {
                message: "ping".to_string(),
            }),
        )
        .await;
        assert_eq!(response.history.len(), 2);

        let Json(cleared) = clear_chat(State(state.clone())).await;
        assert!(cleared.history.is_empty());
        assert_eq!(cleared.status.as_deref(), Some("Chat history cleared."));
    }

    #[tokio::test]
    async fn test_text_status_search_clear() {
        let state = state();

        let Json(added) = add_text(
            State(state.clone()),
            Json(TextRequest {
                text: "Deploy with cargo dist".to_string(),
            }),
        )
        .await;
        assert_eq!(added.status, "Added text to knowledge base (1 chunks).");

        let Json(kb) = status(State(state.clone())).await;
        assert_eq!(kb.document_count, 1);
        assert!(kb.has_documents);
        assert_eq!(kb.status, "Documents in knowledge base: 1");

        let Json(found) = search(
            State(state.clone()),
            Query(SearchQuery {
                q: "deploy".to_string(),
            }),
        )
        .await;
        assert_eq!(found.results.len(), 1);
        assert!(found.status.contains("(Source: manual_input)"));

        let Json(cleared) = clear_documents(State(state.clone())).await;
        assert_eq!(cleared.status, "Knowledge base cleared.");
    }
}
