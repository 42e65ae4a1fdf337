//! Conversation data model: stored conversations and their list views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::Message;

/// Messages included in a summary preview.
const PREVIEW_MESSAGES: usize = 3;

/// Characters of each message carried into the preview.
const PREVIEW_SNIPPET_CHARS: usize = 30;

/// Cap on total preview length, ellipsis included.
const PREVIEW_MAX_CHARS: usize = 120;

/// A stored conversation: user-supplied metadata plus the reconstructed
/// messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation ID.
    pub id: Uuid,
    /// User-supplied title.
    pub title: String,
    /// User-supplied category (e.g. the source app).
    pub category: String,
    /// Free-form labels.
    pub tags: Vec<String>,
    /// When the conversation was first stored.
    pub created_at: DateTime<Utc>,
    /// Reconstructed messages, in conversation order.
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Create an empty conversation with the given metadata.
    pub fn new(
        id: Uuid,
        title: impl Into<String>,
        category: impl Into<String>,
        tags: Vec<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            category: category.into(),
            tags,
            created_at: Utc::now(),
            messages: Vec::new(),
        }
    }

    /// Listing-friendly view without the full message payload.
    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            id: self.id,
            title: self.title.clone(),
            category: self.category.clone(),
            tags: self.tags.clone(),
            created_at: self.created_at,
            message_count: self.messages.len(),
            preview: preview(&self.messages),
        }
    }
}

/// Compact conversation view returned by list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub message_count: usize,
    pub preview: String,
}

/// Metadata attached to an upload batch.
#[derive(Debug, Clone)]
pub struct ConversationMeta {
    pub title: String,
    pub category: String,
    pub tags: Vec<String>,
}

/// Partial metadata update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataUpdate {
    pub title: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Short text preview built from the first few messages.
fn preview(messages: &[Message]) -> String {
    let mut text = messages
        .iter()
        .take(PREVIEW_MESSAGES)
        .map(|m| m.content.chars().take(PREVIEW_SNIPPET_CHARS).collect::<String>())
        .collect::<Vec<_>>()
        .join(". ");

    if text.chars().count() > PREVIEW_MAX_CHARS {
        text = text.chars().take(PREVIEW_MAX_CHARS - 3).collect();
        text.push_str("...");
    }
    text
}
