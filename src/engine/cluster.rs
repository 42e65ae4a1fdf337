//! Token clustering groups positioned tokens into visual lines.
//!
//! The recognizer emits a flat token stream tagged with layout indices
//! (block, paragraph, line, word). Clustering walks that stream in layout
//! order and accumulates tokens into a line until either the layout triple
//! changes or a vertical gap larger than `gap_factor` times the current line
//! height opens up. End of stream always flushes the final accumulated line.

use tracing::debug;

use crate::config::EngineConfig;
use crate::engine::types::{FrameContext, Line, Token};

/// Cluster a token stream into ordered visual lines.
///
/// Tokens with confidence at or below the threshold, tokens inside the
/// header/footer chrome bands, and empty tokens never enter a line.
pub fn cluster_lines(tokens: &[Token], ctx: &FrameContext, config: &EngineConfig) -> Vec<Line> {
    let header_edge = ctx.image_height * config.header_band;
    let footer_edge = ctx.image_height * config.footer_band;

    let mut usable: Vec<&Token> = tokens
        .iter()
        .filter(|t| !t.text.trim().is_empty())
        .filter(|t| t.confidence > config.confidence_threshold)
        .filter(|t| t.top >= header_edge && t.top <= footer_edge)
        .collect();
    usable.sort_by_key(|t| t.layout_key());

    let mut lines = Vec::new();
    let mut current: Option<LineAccumulator> = None;

    for token in usable {
        match current.as_mut() {
            Some(acc) if !acc.breaks_before(token, config.gap_factor) => acc.extend(token),
            _ => {
                if let Some(acc) = current.take() {
                    lines.push(acc.finish());
                }
                current = Some(LineAccumulator::start(token));
            }
        }
    }

    if let Some(acc) = current.take() {
        lines.push(acc.finish());
    }

    debug!(
        tokens = tokens.len(),
        lines = lines.len(),
        "Clustered token stream"
    );
    lines
}

/// Accumulates one visual line; ACCUMULATING until a break, then FLUSH.
struct LineAccumulator {
    tokens: Vec<Token>,
    triple: (u32, u32, u32),
    left: f32,
    top: f32,
    width: f32,
    height: f32,
    /// Running maximum of token bottom edges, used for the gap rule.
    bottom: f32,
}

impl LineAccumulator {
    fn start(token: &Token) -> Self {
        Self {
            triple: (token.block_index, token.paragraph_index, token.line_index),
            left: token.left,
            top: token.top,
            width: token.width,
            height: token.height,
            bottom: token.bottom(),
            tokens: vec![token.clone()],
        }
    }

    /// True when `token` must open a new line instead of joining this one.
    fn breaks_before(&self, token: &Token, gap_factor: f32) -> bool {
        let new_triple = (token.block_index, token.paragraph_index, token.line_index);
        if new_triple != self.triple {
            return true;
        }
        self.height > 0.0
            && self.bottom > 0.0
            && (token.top - self.bottom) > self.height * gap_factor
    }

    fn extend(&mut self, token: &Token) {
        self.width = (token.left + token.width) - self.left;
        self.height = self.height.max(token.height);
        self.bottom = self.bottom.max(token.bottom());
        self.tokens.push(token.clone());
    }

    fn finish(self) -> Line {
        let raw_text = self
            .tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Line {
            tokens: self.tokens,
            left: self.left,
            top: self.top,
            width: self.width,
            height: self.height,
            raw_text,
        }
    }
}
