//! In-memory conversation store.
//!
//! The only store backend for now. Everything lives in a `RwLock<HashMap>`,
//! so contents are lost on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::engine::{self, Message};
use crate::error::StoreError;
use crate::store::model::{Conversation, ConversationMeta, ConversationSummary, MetadataUpdate};
use crate::store::traits::ConversationStore;

/// In-memory store backed by a `HashMap` keyed on conversation ID.
pub struct MemoryStore {
    conversations: RwLock<HashMap<Uuid, Conversation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            conversations: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn merge_batch(
        &self,
        id: Uuid,
        meta: ConversationMeta,
        messages: Vec<Message>,
    ) -> Result<usize, StoreError> {
        let mut conversations = self.conversations.write().await;

        let count = match conversations.get_mut(&id) {
            Some(existing) => {
                existing.title = meta.title;
                existing.category = meta.category;
                existing.tags = meta.tags;
                let prior = std::mem::take(&mut existing.messages);
                existing.messages = engine::merge(prior, messages);
                existing.messages.len()
            }
            None => {
                let mut conversation = Conversation::new(id, meta.title, meta.category, meta.tags);
                conversation.messages = messages;
                let count = conversation.messages.len();
                conversations.insert(id, conversation);
                count
            }
        };

        info!(conversation_id = %id, stored = count, "Stored conversation batch");
        Ok(count)
    }

    async fn get(&self, id: Uuid) -> Result<Conversation, StoreError> {
        let conversations = self.conversations.read().await;
        conversations
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { id })
    }

    async fn list(&self) -> Result<Vec<ConversationSummary>, StoreError> {
        let conversations = self.conversations.read().await;
        let mut summaries: Vec<ConversationSummary> =
            conversations.values().map(Conversation::summary).collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    async fn update_metadata(
        &self,
        id: Uuid,
        update: MetadataUpdate,
    ) -> Result<Conversation, StoreError> {
        let mut conversations = self.conversations.write().await;
        let conversation = conversations
            .get_mut(&id)
            .ok_or(StoreError::NotFound { id })?;

        if let Some(title) = update.title {
            conversation.title = title;
        }
        if let Some(category) = update.category {
            conversation.category = category;
        }
        if let Some(tags) = update.tags {
            conversation.tags = tags;
        }

        debug!(conversation_id = %id, "Updated conversation metadata");
        Ok(conversation.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut conversations = self.conversations.write().await;
        conversations
            .remove(&id)
            .ok_or(StoreError::NotFound { id })?;
        info!(conversation_id = %id, "Deleted conversation");
        Ok(())
    }
}
