//! Chat Recall: chat screenshots in, ordered transcripts out.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod recognition;
pub mod store;
