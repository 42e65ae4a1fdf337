//! Upload processing pipeline.
//!
//! Every uploaded screenshot flows through:
//! 1. `decode_bitmap`: bytes to grayscale bitmap
//! 2. Region selection: find and crop the conversation viewport
//! 3. `RecognitionBackend::recognize`: external vision call
//! 4. `engine::reconstruct`: pure reconstruction of the message list
//!
//! The processor owns batch concerns only: concurrency, upload-order
//! merging, per-image failure accounting, and cancellation.

pub mod processor;
pub mod types;

pub use processor::BatchProcessor;
pub use types::{BatchOutcome, CancelFlag, UploadItem};
