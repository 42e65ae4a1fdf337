//! Image recognition backends.
//!
//! A [`RecognitionBackend`] turns a grayscale bitmap into either positioned
//! tokens (layout-aware OCR) or a flat transcript (vision chat model). The
//! reconstruction engine accepts both through
//! [`ParseStrategy`](crate::engine::ParseStrategy), so backends are free to
//! report whichever shape they natively produce.

pub mod decode;
pub mod http_vision;

pub use decode::decode_bitmap;
pub use http_vision::HttpVisionBackend;

use std::sync::Arc;

use async_trait::async_trait;
use image::GrayImage;

use crate::config::VisionConfig;
use crate::engine::Token;
use crate::error::RecognitionError;

/// What a backend produced for one bitmap.
#[derive(Debug, Clone)]
pub enum RecognitionOutput {
    /// Positioned tokens with layout indices and confidences.
    Tokens(Vec<Token>),
    /// A flat transcript with no geometry.
    Text(String),
    /// The backend saw nothing usable in the image.
    Empty,
}

/// Recognizes text in chat screenshots.
#[async_trait]
pub trait RecognitionBackend: Send + Sync {
    /// Short identifier used in logs and error messages.
    fn name(&self) -> &str;

    /// Recognize the contents of one grayscale bitmap.
    async fn recognize(&self, image: &GrayImage) -> Result<RecognitionOutput, RecognitionError>;
}

/// Create the recognition backend from configuration.
pub fn create_backend(
    config: &VisionConfig,
) -> Result<Arc<dyn RecognitionBackend>, RecognitionError> {
    let backend = HttpVisionBackend::new(config.clone())?;
    tracing::info!(model = %config.model, "Using HTTP vision backend");
    Ok(Arc::new(backend))
}
