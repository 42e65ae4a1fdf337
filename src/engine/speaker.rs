//! Speaker identity: resolving the other participant's name and assigning
//! a sender to each line by horizontal position.

use regex::Regex;
use tracing::debug;

use crate::config::{EngineConfig, MarginTieBreak};
use crate::engine::normalize::edge_noise;
use crate::engine::types::{FrameContext, Line};

/// Extracts a display name from recognized header-region text.
pub struct NameResolver {
    typing_re: Regex,
}

impl NameResolver {
    pub fn new() -> Self {
        Self {
            typing_re: Regex::new(r"(?i)\s*typing.*$").unwrap(),
        }
    }

    /// Resolve the other participant's display name.
    ///
    /// Strips "typing…"-style suffixes and glyph noise, then takes the first
    /// whitespace-delimited word. The word is accepted only when it is longer
    /// than one character and starts uppercase; anything else degrades to the
    /// fallback name rather than failing the image.
    pub fn resolve(&self, raw: &str, fallback: &str) -> String {
        let stripped = self.typing_re.replace(raw, "");
        let stripped = stripped.trim_matches(edge_noise);

        let Some(word) = stripped.split_whitespace().next() else {
            debug!("Header region produced no usable text, using fallback name");
            return fallback.to_string();
        };

        let starts_upper = word.chars().next().map(|c| c.is_uppercase()).unwrap_or(false);
        if word.chars().count() > 1 && starts_upper {
            debug!(name = word, "Resolved other speaker from header");
            word.to_string()
        } else {
            debug!(
                candidate = word,
                "Header text does not look like a name, using fallback"
            );
            fallback.to_string()
        }
    }
}

impl Default for NameResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Which side of the layout a line belongs to. `Unknown` lines are centered
/// chrome and never become messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    You,
    Other,
    Unknown,
}

/// Classify a line by its horizontal center relative to the image midline.
///
/// A dead zone of `center_margin × image_width` on each side of the midline
/// absorbs centered system notices and date separators.
pub fn classify(line: &Line, ctx: &FrameContext, config: &EngineConfig) -> Side {
    let center = line.center();
    let mid = ctx.image_width / 2.0;
    let margin = ctx.image_width * config.center_margin;

    match config.margin_tie_break {
        MarginTieBreak::DeadZone => {
            if center > mid + margin {
                Side::You
            } else if center < mid - margin {
                Side::Other
            } else {
                Side::Unknown
            }
        }
        MarginTieBreak::Outward => {
            if center >= mid + margin {
                Side::You
            } else if center <= mid - margin {
                Side::Other
            } else {
                Side::Unknown
            }
        }
    }
}
