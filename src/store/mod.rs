//! Persistence layer: conversation storage behind the `ConversationStore`
//! trait.

pub mod memory;
pub mod model;
pub mod traits;

pub use memory::MemoryStore;
pub use model::{Conversation, ConversationMeta, ConversationSummary, MetadataUpdate};
pub use traits::ConversationStore;
