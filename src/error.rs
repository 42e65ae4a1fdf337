//! Error types for chat-recall.

use uuid::Uuid;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    #[error("Recognition error: {0}")]
    Recognition(#[from] RecognitionError),

    #[error("Reconstruction error: {0}")]
    Reconstruct(#[from] ReconstructError),

    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Image decoding errors. Fatal for the affected image only.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Cannot decode image {name}: {reason}")]
    Decode { name: String, reason: String },

    #[error("Unsupported image format: {name}")]
    UnsupportedFormat { name: String },
}

/// Recognition-backend errors.
#[derive(Debug, thiserror::Error)]
pub enum RecognitionError {
    #[error("Recognition backend {backend} unavailable: {reason}")]
    Unavailable { backend: String, reason: String },

    #[error("Recognition backend {backend} request failed: {reason}")]
    RequestFailed { backend: String, reason: String },

    #[error("Invalid response from {backend}: {reason}")]
    InvalidResponse { backend: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Structure-reconstruction errors.
#[derive(Debug, thiserror::Error)]
pub enum ReconstructError {
    #[error("No messages extracted from recognized content")]
    NoMessages,
}

/// Batch-level errors.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("All {failed} images in the batch failed, nothing to persist")]
    EmptyBatch { failed: usize },

    #[error("Batch contained no files")]
    NoFiles,
}

/// Conversation-store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Conversation not found: {id}")]
    NotFound { id: Uuid },
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
