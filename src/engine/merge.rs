//! Cross-source merging combines message lists from multiple screenshots
//! without duplication.
//!
//! Screenshots of one conversation overlap, so the same bubble shows up in
//! consecutive captures. Merging starts from the already-accepted list and
//! appends only messages whose (sender, content) pair has not been seen.
//! Accepted messages are never reordered, not even by timestamp.

use tracing::debug;

use crate::engine::types::Message;

/// Merge `new` into `existing`, skipping exact (sender, content) duplicates.
pub fn merge(existing: Vec<Message>, new: Vec<Message>) -> Vec<Message> {
    if existing.is_empty() {
        return new;
    }

    let mut merged = existing;
    for candidate in new {
        if merged.iter().any(|m| m.is_duplicate_of(&candidate)) {
            debug!(
                sender = %candidate.sender,
                content = %candidate.content,
                "Skipping duplicate message"
            );
            continue;
        }
        merged.push(candidate);
    }
    merged
}
