//! Bitmap decoding for uploaded screenshots.

use image::GrayImage;
use tracing::debug;

use crate::error::ImageError;

/// Decode an uploaded image into an 8-bit grayscale bitmap.
///
/// The pipeline works in grayscale throughout; color carries no signal for
/// text layout.
pub fn decode_bitmap(bytes: &[u8], name: &str) -> Result<GrayImage, ImageError> {
    let format = image::guess_format(bytes).map_err(|_| ImageError::UnsupportedFormat {
        name: name.to_string(),
    })?;

    let decoded = image::load_from_memory(bytes).map_err(|e| ImageError::Decode {
        name: name.to_string(),
        reason: e.to_string(),
    })?;

    let gray = decoded.to_luma8();
    debug!(
        name = %name,
        format = ?format,
        width = gray.width(),
        height = gray.height(),
        "Decoded image"
    );
    Ok(gray)
}
