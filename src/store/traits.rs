//! `ConversationStore` trait: single async interface for conversation
//! persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::engine::Message;
use crate::error::StoreError;
use crate::store::model::{Conversation, ConversationMeta, ConversationSummary, MetadataUpdate};

/// Backend-agnostic conversation storage.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Merge a batch of reconstructed messages into a conversation, creating
    /// it if it does not exist yet. Metadata is refreshed from `meta` on
    /// every call; `created_at` keeps its original value. Returns the stored
    /// message count after merging.
    async fn merge_batch(
        &self,
        id: Uuid,
        meta: ConversationMeta,
        messages: Vec<Message>,
    ) -> Result<usize, StoreError>;

    /// Get a conversation with all its messages.
    async fn get(&self, id: Uuid) -> Result<Conversation, StoreError>;

    /// List all conversations as summaries, newest first.
    async fn list(&self) -> Result<Vec<ConversationSummary>, StoreError>;

    /// Apply a partial metadata update. Returns the updated conversation.
    async fn update_metadata(
        &self,
        id: Uuid,
        update: MetadataUpdate,
    ) -> Result<Conversation, StoreError>;

    /// Delete a conversation.
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}
