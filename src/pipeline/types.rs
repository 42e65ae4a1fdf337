//! Pipeline data types.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::engine::Message;

/// One uploaded screenshot, already read into memory.
#[derive(Debug, Clone)]
pub struct UploadItem {
    /// Client-supplied file name, used in logs and error messages.
    pub filename: String,
    /// Raw encoded image bytes.
    pub bytes: Vec<u8>,
}

impl UploadItem {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}

/// Batch-boundary cancellation flag.
///
/// Checked once before each image starts; in-flight images always run to
/// completion. Skipped images count as neither processed nor failed.
pub type CancelFlag = Arc<AtomicBool>;

/// Result of one upload batch.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Batch transcript: per-image message lists merged in upload order.
    pub messages: Vec<Message>,
    /// Images that produced messages.
    pub files_processed: usize,
    /// Images that failed to decode, recognize, or reconstruct.
    pub files_failed: usize,
}
