//! Batch processor: turns uploaded screenshots into a merged transcript.
//!
//! Flow per image:
//! 1. Decode bytes → grayscale bitmap
//! 2. Select the conversation viewport, crop
//! 3. Recognize the header name region → other participant's display name
//! 4. Recognize the viewport → token stream or free text
//! 5. Reconstruct the ordered message list
//!
//! Images are recognized concurrently up to a configured limit. Results are
//! always merged in upload order, not completion order. A failure on one
//! image never aborts its siblings; it becomes a per-image failure count.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use futures::stream::{self, StreamExt};
use image::GrayImage;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::engine::speaker::NameResolver;
use crate::engine::{self, FrameContext, Message, ParseStrategy, Token, region};
use crate::error::{BatchError, Error, ReconstructError};
use crate::pipeline::types::{BatchOutcome, CancelFlag, UploadItem};
use crate::recognition::{RecognitionBackend, RecognitionOutput, decode_bitmap};

/// Processes upload batches: decode, recognize, reconstruct, merge.
pub struct BatchProcessor {
    backend: Arc<dyn RecognitionBackend>,
    config: EngineConfig,
    concurrency: usize,
    names: NameResolver,
}

impl BatchProcessor {
    /// Create a new batch processor.
    pub fn new(
        backend: Arc<dyn RecognitionBackend>,
        config: EngineConfig,
        concurrency: usize,
    ) -> Self {
        Self {
            backend,
            config,
            concurrency: concurrency.max(1),
            names: NameResolver::new(),
        }
    }

    /// Process one upload batch into a merged, duplicate-free transcript.
    ///
    /// Fails with [`BatchError::NoFiles`] on an empty batch and
    /// [`BatchError::EmptyBatch`] when no image yields a single message.
    pub async fn process_batch(
        &self,
        items: Vec<UploadItem>,
        cancel: CancelFlag,
    ) -> Result<BatchOutcome, BatchError> {
        if items.is_empty() {
            return Err(BatchError::NoFiles);
        }

        info!(files = items.len(), "Processing upload batch");

        // buffered() starts futures in upload order and yields results in
        // that same order, so the merge below sees image results exactly as
        // they were uploaded.
        let results: Vec<Option<Result<Vec<Message>, Error>>> = stream::iter(items)
            .map(|item| {
                let cancel = cancel.clone();
                async move {
                    if cancel.load(Ordering::Relaxed) {
                        debug!(file = %item.filename, "Batch cancelled, skipping image");
                        return None;
                    }
                    match self.process_image(&item).await {
                        Ok(messages) => Some(Ok(messages)),
                        Err(e) => {
                            warn!(file = %item.filename, error = %e, "Failed to process image");
                            Some(Err(e))
                        }
                    }
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut messages: Vec<Message> = Vec::new();
        let mut files_processed = 0;
        let mut files_failed = 0;
        for result in results {
            match result {
                Some(Ok(image_messages)) => {
                    files_processed += 1;
                    messages = engine::merge(messages, image_messages);
                }
                Some(Err(_)) => files_failed += 1,
                None => {}
            }
        }

        if messages.is_empty() {
            return Err(BatchError::EmptyBatch {
                failed: files_failed,
            });
        }

        info!(
            messages = messages.len(),
            files_processed, files_failed, "Upload batch complete"
        );
        Ok(BatchOutcome {
            messages,
            files_processed,
            files_failed,
        })
    }

    /// Run the full per-image pipeline.
    async fn process_image(&self, item: &UploadItem) -> Result<Vec<Message>, Error> {
        let bitmap = decode_bitmap(&item.bytes, &item.filename)?;

        let viewport = region::select_viewport(&bitmap, &self.config);
        let other_speaker = self.resolve_speaker_name(&bitmap).await;

        let crop = region::crop(&bitmap, viewport);
        let output = self.backend.recognize(&crop).await?;

        let strategy = match output {
            RecognitionOutput::Tokens(tokens) => ParseStrategy::Layout(tokens),
            RecognitionOutput::Text(text) => ParseStrategy::FreeText(text),
            RecognitionOutput::Empty => {
                debug!(file = %item.filename, "Recognition produced no output");
                return Err(ReconstructError::NoMessages.into());
            }
        };

        let ctx = FrameContext::new(crop.width(), crop.height(), other_speaker);
        let messages = engine::reconstruct(&ctx, strategy, &self.config)?;

        debug!(
            file = %item.filename,
            messages = messages.len(),
            "Image reconstructed"
        );
        Ok(messages)
    }

    /// Best-effort read of the other participant's display name from the
    /// chat header. Any failure falls back to the configured name.
    async fn resolve_speaker_name(&self, bitmap: &GrayImage) -> String {
        let name_region = region::header_name_region(bitmap.width(), bitmap.height(), &self.config);
        let crop = region::crop(bitmap, name_region);

        let raw = match self.backend.recognize(&crop).await {
            Ok(RecognitionOutput::Text(text)) => text,
            Ok(RecognitionOutput::Tokens(mut tokens)) => {
                tokens.sort_by_key(Token::layout_key);
                tokens
                    .iter()
                    .map(|t| t.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            }
            Ok(RecognitionOutput::Empty) => String::new(),
            Err(e) => {
                warn!(error = %e, "Name recognition failed, using fallback speaker");
                String::new()
            }
        };

        self.names.resolve(&raw, &self.config.fallback_speaker)
    }
}
