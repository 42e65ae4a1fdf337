//! REST endpoints for screenshot upload and conversation management.
//!
//! Routes:
//! 1. `POST /api/upload` → multipart screenshots + metadata → reconstructed batch
//!    merged into a new or existing conversation
//! 2. `GET /api/conversations` → summaries, newest first
//! 3. `GET|PUT|DELETE /api/conversations/{id}` → fetch, edit metadata, remove
//!
//! Handlers stay thin: multipart decoding and status mapping here, everything
//! else in the batch processor and the store.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::cors::{self, CorsLayer};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{BatchError, StoreError};
use crate::pipeline::{BatchProcessor, CancelFlag, UploadItem};
use crate::store::{ConversationMeta, ConversationStore, MetadataUpdate};

/// Upload body cap. Phone screenshots run a few MB each and batches
/// arrive a handful at a time.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ConversationStore>,
    pub processor: Arc<BatchProcessor>,
}

/// Build the Axum router with upload and conversation routes.
pub fn api_routes(store: Arc<dyn ConversationStore>, processor: Arc<BatchProcessor>) -> Router {
    let state = AppState { store, processor };

    Router::new()
        .route("/health", get(health))
        .route("/api/upload", post(upload))
        .route("/api/conversations", get(list_conversations))
        .route(
            "/api/conversations/{id}",
            get(get_conversation)
                .put(update_conversation)
                .delete(delete_conversation),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods(cors::Any)
                .allow_headers(cors::Any),
        )
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "chat-recall"
    }))
}

// ── Upload ──────────────────────────────────────────────────────────────

/// Multipart fields accepted by `POST /api/upload`.
///
/// `files` repeats once per screenshot. `conversation_id` is optional; when
/// absent (or blank) a fresh conversation is created.
#[derive(Default)]
struct UploadForm {
    items: Vec<UploadItem>,
    title: Option<String>,
    category: Option<String>,
    tags: Vec<String>,
    conversation_id: Option<Uuid>,
}

async fn upload(State(state): State<AppState>, multipart: Multipart) -> impl IntoResponse {
    let form = match read_upload_form(multipart).await {
        Ok(form) => form,
        Err(reason) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": reason})),
            );
        }
    };

    let Some(title) = form.title else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Missing required field: title"})),
        );
    };
    let Some(category) = form.category else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Missing required field: category"})),
        );
    };

    let conversation_id = form.conversation_id.unwrap_or_else(Uuid::new_v4);
    let file_count = form.items.len();

    // HTTP disconnects do not reach into running pipelines, so the flag
    // stays unset for the lifetime of the request.
    let cancel = CancelFlag::default();
    let outcome = match state.processor.process_batch(form.items, cancel).await {
        Ok(outcome) => outcome,
        Err(BatchError::NoFiles) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "No files uploaded"})),
            );
        }
        Err(BatchError::EmptyBatch { failed }) => {
            warn!(failed, "Upload produced no messages");
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({
                    "error": "No messages could be reconstructed from the uploaded images",
                    "files_failed": failed,
                })),
            );
        }
    };

    let message_count = outcome.messages.len();
    let meta = ConversationMeta {
        title,
        category,
        tags: form.tags,
    };
    let stored = match state
        .store
        .merge_batch(conversation_id, meta, outcome.messages)
        .await
    {
        Ok(stored) => stored,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": format!("Failed to store conversation: {e}")})),
            );
        }
    };

    info!(
        conversation_id = %conversation_id,
        files = file_count,
        files_failed = outcome.files_failed,
        stored,
        "Upload batch stored"
    );

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "conversation_id": conversation_id,
            "message_count": message_count,
            "files_processed": outcome.files_processed,
            "files_failed": outcome.files_failed,
        })),
    )
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, String> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Malformed upload: {e}"))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "files" => {
                let filename = field.file_name().unwrap_or("unnamed").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| format!("Failed to read '{filename}': {e}"))?;
                form.items.push(UploadItem::new(filename, bytes.to_vec()));
            }
            "title" => form.title = field.text().await.ok(),
            "category" => form.category = field.text().await.ok(),
            "tags" => {
                let raw = field.text().await.unwrap_or_default();
                form.tags = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from)
                    .collect();
            }
            "conversation_id" => {
                let raw = field.text().await.unwrap_or_default();
                let raw = raw.trim();
                if !raw.is_empty() {
                    let id = Uuid::parse_str(raw)
                        .map_err(|_| "Invalid conversation ID".to_string())?;
                    form.conversation_id = Some(id);
                }
            }
            other => {
                warn!(field = other, "Ignoring unknown upload field");
            }
        }
    }

    Ok(form)
}

// ── Conversations ───────────────────────────────────────────────────────

async fn list_conversations(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.list().await {
        Ok(summaries) => (StatusCode::OK, Json(serde_json::json!(summaries))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": format!("Failed to list conversations: {e}")})),
        ),
    }
}

async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let conversation_id = match Uuid::parse_str(&id) {
        Ok(id) => id,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "Invalid conversation ID"})),
            );
        }
    };

    match state.store.get(conversation_id).await {
        Ok(conversation) => (StatusCode::OK, Json(serde_json::json!(conversation))),
        Err(StoreError::NotFound { .. }) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Conversation not found"})),
        ),
    }
}

async fn update_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<MetadataUpdate>,
) -> impl IntoResponse {
    let conversation_id = match Uuid::parse_str(&id) {
        Ok(id) => id,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "Invalid conversation ID"})),
            );
        }
    };

    match state.store.update_metadata(conversation_id, update).await {
        Ok(conversation) => (StatusCode::OK, Json(serde_json::json!(conversation))),
        Err(StoreError::NotFound { .. }) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Conversation not found"})),
        ),
    }
}

async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let conversation_id = match Uuid::parse_str(&id) {
        Ok(id) => id,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "Invalid conversation ID"})),
            );
        }
    };

    match state.store.delete(conversation_id).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({"status": "success"}))),
        Err(StoreError::NotFound { .. }) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Conversation not found"})),
        ),
    }
}
