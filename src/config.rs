//! Configuration types.

use crate::error::ConfigError;

/// How to attribute a line whose center lands exactly on the margin boundary.
///
/// Observed chat layouts occasionally center a bubble right on `mid ± margin`;
/// which side wins there is a product decision, not a geometric fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarginTieBreak {
    /// Boundary counts as part of the dead zone: the line stays `Unknown` and
    /// is dropped.
    DeadZone,
    /// Boundary counts as part of the side it borders.
    Outward,
}

/// Heuristic constants for the reconstruction engine.
///
/// All ratios are fractions of the full image dimension they apply to.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Tokens at or below this recognition confidence are discarded.
    pub confidence_threshold: f32,
    /// Tokens whose top edge is above this fraction of image height are
    /// treated as header chrome and excluded.
    pub header_band: f32,
    /// Tokens whose top edge is below this fraction of image height are
    /// treated as footer chrome and excluded.
    pub footer_band: f32,
    /// A vertical gap larger than this multiple of the current line height
    /// starts a new line even within the same layout triple.
    pub gap_factor: f32,
    /// Half-width of the dead zone around the image centerline, as a
    /// fraction of image width.
    pub center_margin: f32,
    /// Tie-break for centers landing exactly on `mid ± margin`.
    pub margin_tie_break: MarginTieBreak,
    /// Name used for the non-local participant when the header yields
    /// nothing usable.
    pub fallback_speaker: String,
    /// Header sub-region recognized for the other participant's display
    /// name, as fractions of (width, height, width, height).
    pub name_crop_left: f32,
    pub name_crop_top: f32,
    pub name_crop_right: f32,
    pub name_crop_bottom: f32,
    /// Grayscale value above which a pixel counts as bright during region
    /// binarization.
    pub binarize_threshold: u8,
    /// Bright regions smaller than this are ignored when selecting the
    /// conversation viewport.
    pub min_region_width: u32,
    pub min_region_height: u32,
    /// Regions entirely inside the first this-fraction of image width are
    /// assumed to be a navigation sidebar and ignored.
    pub sidebar_band: f32,
    /// Pixels added on every side of the selected region before clamping.
    pub region_padding: u32,
    /// Fallback viewport when no region qualifies, as fractions of
    /// (width, height, height); the width spans the remainder.
    pub fallback_region_left: f32,
    pub fallback_region_top: f32,
    pub fallback_region_height: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 40.0,
            header_band: 0.11,
            footer_band: 0.95,
            gap_factor: 1.5,
            center_margin: 0.05,
            margin_tie_break: MarginTieBreak::DeadZone,
            fallback_speaker: "Other Speaker".to_string(),
            name_crop_left: 0.05,
            name_crop_top: 0.02,
            name_crop_right: 0.35,
            name_crop_bottom: 0.10,
            binarize_threshold: 200,
            min_region_width: 120,
            min_region_height: 120,
            sidebar_band: 0.30,
            region_padding: 10,
            fallback_region_left: 0.25,
            fallback_region_top: 0.10,
            fallback_region_height: 0.85,
        }
    }
}

/// Remote vision endpoint used when the recognition backend is HTTP-based.
#[derive(Debug, Clone)]
pub struct VisionConfig {
    pub api_url: String,
    pub api_key: secrecy::SecretString,
    pub model: String,
}

/// Service-level configuration read from the environment.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Port the HTTP API binds to.
    pub port: u16,
    /// Maximum images recognized concurrently within one batch.
    pub upload_concurrency: usize,
    /// Vision endpoint configuration; `None` disables remote recognition.
    pub vision: Option<VisionConfig>,
}

impl ServiceConfig {
    /// Read configuration from `CHAT_RECALL_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = parse_env("CHAT_RECALL_PORT", 8000u16)?;
        let upload_concurrency = parse_env("CHAT_RECALL_UPLOAD_CONCURRENCY", 4usize)?;
        if upload_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                key: "CHAT_RECALL_UPLOAD_CONCURRENCY".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        let vision = std::env::var("CHAT_RECALL_VISION_API_KEY")
            .ok()
            .map(|api_key| VisionConfig {
                api_url: std::env::var("CHAT_RECALL_VISION_URL").unwrap_or_else(|_| {
                    "https://router.huggingface.co/v1/chat/completions".to_string()
                }),
                api_key: secrecy::SecretString::from(api_key),
                model: std::env::var("CHAT_RECALL_VISION_MODEL").unwrap_or_else(|_| {
                    "meta-llama/Llama-4-Scout-17B-16E-Instruct".to_string()
                }),
            });

        Ok(Self {
            port,
            upload_concurrency,
            vision,
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("could not parse '{raw}'"),
        }),
        Err(_) => Ok(default),
    }
}
