//! Region selection locates the conversation viewport inside a screenshot.
//!
//! Chat apps surround the message area with chrome: a navigation sidebar on
//! the left, a contact header on top, an input bar below. The selector
//! binarizes the grayscale bitmap, collects connected bright regions, throws
//! away ones that are too small or sit inside the sidebar band, and keeps the
//! largest survivor. When nothing qualifies it falls back to a fixed
//! proportional rectangle instead of failing.

use image::GrayImage;
use tracing::debug;

use crate::config::EngineConfig;
use crate::engine::types::Region;

/// Select the crop believed to contain only the message area.
pub fn select_viewport(image: &GrayImage, config: &EngineConfig) -> Region {
    let (width, height) = image.dimensions();
    let sidebar_edge = (width as f32 * config.sidebar_band) as u32;

    let candidates = bright_regions(image, config.binarize_threshold);
    let best = candidates
        .into_iter()
        .filter(|r| r.width >= config.min_region_width && r.height >= config.min_region_height)
        .filter(|r| r.right() > sidebar_edge)
        .max_by_key(Region::area);

    match best {
        Some(region) => {
            let padded = pad_and_clamp(region, config.region_padding, width, height);
            debug!(
                left = padded.left,
                top = padded.top,
                width = padded.width,
                height = padded.height,
                "Selected conversation viewport"
            );
            padded
        }
        None => {
            let fallback = fallback_viewport(width, height, config);
            debug!(
                left = fallback.left,
                top = fallback.top,
                "No qualifying region, using proportional fallback viewport"
            );
            fallback
        }
    }
}

/// The fixed top-left sub-region recognized for the other participant's
/// display name.
pub fn header_name_region(width: u32, height: u32, config: &EngineConfig) -> Region {
    let left = (width as f32 * config.name_crop_left) as u32;
    let top = (height as f32 * config.name_crop_top) as u32;
    let right = (width as f32 * config.name_crop_right) as u32;
    let bottom = (height as f32 * config.name_crop_bottom) as u32;
    Region {
        left,
        top,
        width: right.saturating_sub(left).max(1),
        height: bottom.saturating_sub(top).max(1),
    }
}

/// Cut a region out of the bitmap.
pub fn crop(image: &GrayImage, region: Region) -> GrayImage {
    image::imageops::crop_imm(image, region.left, region.top, region.width, region.height)
        .to_image()
}

/// Bounding boxes of all 4-connected runs of pixels brighter than the
/// threshold.
fn bright_regions(image: &GrayImage, threshold: u8) -> Vec<Region> {
    let (width, height) = image.dimensions();
    let mut visited = vec![false; (width * height) as usize];
    let mut regions = Vec::new();
    let mut stack = Vec::new();

    for start_y in 0..height {
        for start_x in 0..width {
            let start_idx = (start_y * width + start_x) as usize;
            if visited[start_idx] || image.get_pixel(start_x, start_y).0[0] <= threshold {
                continue;
            }

            let (mut min_x, mut max_x) = (start_x, start_x);
            let (mut min_y, mut max_y) = (start_y, start_y);
            visited[start_idx] = true;
            stack.push((start_x, start_y));

            while let Some((x, y)) = stack.pop() {
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);

                let mut neighbors = [(0u32, 0u32); 4];
                let mut count = 0;
                if x > 0 {
                    neighbors[count] = (x - 1, y);
                    count += 1;
                }
                if x + 1 < width {
                    neighbors[count] = (x + 1, y);
                    count += 1;
                }
                if y > 0 {
                    neighbors[count] = (x, y - 1);
                    count += 1;
                }
                if y + 1 < height {
                    neighbors[count] = (x, y + 1);
                    count += 1;
                }

                for &(nx, ny) in &neighbors[..count] {
                    let idx = (ny * width + nx) as usize;
                    if !visited[idx] && image.get_pixel(nx, ny).0[0] > threshold {
                        visited[idx] = true;
                        stack.push((nx, ny));
                    }
                }
            }

            regions.push(Region {
                left: min_x,
                top: min_y,
                width: max_x - min_x + 1,
                height: max_y - min_y + 1,
            });
        }
    }

    regions
}

fn pad_and_clamp(region: Region, padding: u32, width: u32, height: u32) -> Region {
    let left = region.left.saturating_sub(padding);
    let top = region.top.saturating_sub(padding);
    let right = (region.right() + padding).min(width);
    let bottom = (region.bottom() + padding).min(height);
    Region {
        left,
        top,
        width: right - left,
        height: bottom - top,
    }
}

fn fallback_viewport(width: u32, height: u32, config: &EngineConfig) -> Region {
    let left = (width as f32 * config.fallback_region_left) as u32;
    let top = (height as f32 * config.fallback_region_top) as u32;
    let region_height =
        ((height as f32 * config.fallback_region_height) as u32).min(height - top);
    Region {
        left,
        top,
        width: width - left,
        height: region_height,
    }
}
