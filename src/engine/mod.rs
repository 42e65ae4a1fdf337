//! Conversation reconstruction engine.
//!
//! Pure, synchronous computation: positioned tokens (or a free-text
//! transcript) in, ordered speaker-attributed messages out. All I/O lives in
//! the surrounding pipeline; the engine sees only its inputs and read-only
//! configuration.
//!
//! Strategy selection:
//! 1. Layout geometry: cluster → normalize → classify → timestamp.
//! 2. Free text: transcript grammar over the raw block.
//! Layout input whose geometry yields nothing is re-parsed as free text
//! before the image is declared empty.

pub mod cluster;
pub mod freetext;
pub mod merge;
pub mod normalize;
pub mod region;
pub mod speaker;
pub mod types;

pub use merge::merge;
pub use types::{FrameContext, Line, Message, ParseStrategy, Region, Sender, Token};

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::engine::freetext::FreeTextParser;
use crate::engine::normalize::LineNormalizer;
use crate::engine::speaker::Side;
use crate::error::ReconstructError;

/// Reconstruct the ordered message list for one image.
///
/// Fails with [`ReconstructError::NoMessages`] only when every strategy comes
/// up empty.
pub fn reconstruct(
    ctx: &FrameContext,
    payload: ParseStrategy,
    config: &EngineConfig,
) -> Result<Vec<Message>, ReconstructError> {
    let messages = match payload {
        ParseStrategy::Layout(tokens) => {
            let lines = cluster::cluster_lines(&tokens, ctx, config);
            let messages = messages_from_lines(&lines, ctx, config);
            if messages.is_empty() {
                warn!("Layout geometry yielded no messages, retrying as free text");
                let joined = lines
                    .iter()
                    .map(|l| l.raw_text.as_str())
                    .collect::<Vec<_>>()
                    .join("\n");
                parse_free_text(&joined)
            } else {
                messages
            }
        }
        ParseStrategy::FreeText(text) => parse_free_text(&text),
    };

    if messages.is_empty() {
        return Err(ReconstructError::NoMessages);
    }
    debug!(messages = messages.len(), "Reconstructed image transcript");
    Ok(messages)
}

/// Parse a free-form transcript block. Usable on its own when no image
/// geometry ever existed.
pub fn parse_free_text(text: &str) -> Vec<Message> {
    FreeTextParser::new().parse(text)
}

/// Turn clustered lines into messages: normalize away chrome, classify the
/// sender by position, attach the display timestamp.
fn messages_from_lines(
    lines: &[Line],
    ctx: &FrameContext,
    config: &EngineConfig,
) -> Vec<Message> {
    let normalizer = LineNormalizer::new();
    let mut messages = Vec::new();

    for line in lines {
        let Some(content) = normalizer.normalize(&line.raw_text, &ctx.other_speaker) else {
            debug!(raw = %line.raw_text, "Dropped line during normalization");
            continue;
        };

        let sender = match speaker::classify(line, ctx, config) {
            Side::You => Sender::You,
            Side::Other => Sender::Other(ctx.other_speaker.clone()),
            Side::Unknown => {
                debug!(
                    raw = %line.raw_text,
                    center = line.center(),
                    "Dropped line with ambiguous alignment"
                );
                continue;
            }
        };

        let timestamp = normalizer.timestamp(&line.raw_text);
        messages.push(Message::new(sender, content, timestamp, line.top));
    }

    // Sorting by top edge guarantees visual order even when the recognizer
    // reports blocks out of sequence. Stable sort keeps reading order for
    // ties.
    messages.sort_by(|a, b| {
        a.order_key
            .partial_cmp(&b.order_key)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(
        text: &str,
        left: f32,
        top: f32,
        width: f32,
        triple: (u32, u32, u32),
        word: u32,
    ) -> Token {
        Token {
            text: text.to_string(),
            left,
            top,
            width,
            height: 20.0,
            confidence: 90.0,
            block_index: triple.0,
            paragraph_index: triple.1,
            line_index: triple.2,
            word_index: word,
        }
    }

    fn ctx() -> FrameContext {
        FrameContext::new(1000, 1000, "Alice")
    }

    #[test]
    fn reconstructs_two_sided_exchange_without_label_messages() {
        // A left-aligned "Alice" label echo, a right-aligned reply, and a
        // left-aligned reply.
        let tokens = vec![
            tok("Alice", 80.0, 200.0, 60.0, (1, 1, 1), 1),
            tok("10:30", 700.0, 300.0, 50.0, (2, 1, 1), 1),
            tok("Hello", 755.0, 300.0, 60.0, (2, 1, 1), 2),
            tok("10:31", 100.0, 400.0, 50.0, (3, 1, 1), 1),
            tok("Hi", 155.0, 400.0, 30.0, (3, 1, 1), 2),
        ];

        let messages =
            reconstruct(&ctx(), ParseStrategy::Layout(tokens), &EngineConfig::default()).unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::You);
        assert_eq!(messages[0].content, "Hello");
        assert_eq!(messages[0].timestamp.as_deref(), Some("10:30"));
        assert_eq!(messages[1].sender, Sender::Other("Alice".into()));
        assert_eq!(messages[1].content, "Hi");
        assert_eq!(messages[1].timestamp.as_deref(), Some("10:31"));
    }

    #[test]
    fn messages_ordered_top_to_bottom() {
        // Blocks reported out of visual order by the recognizer.
        let tokens = vec![
            tok("bottom", 700.0, 600.0, 80.0, (1, 1, 1), 1),
            tok("top", 700.0, 300.0, 80.0, (2, 1, 1), 1),
        ];

        let messages =
            reconstruct(&ctx(), ParseStrategy::Layout(tokens), &EngineConfig::default()).unwrap();
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["top", "bottom"]);
    }

    #[test]
    fn free_text_strategy_parses_directly() {
        let messages = reconstruct(
            &ctx(),
            ParseStrategy::FreeText("**Bob**\n10:00 — Hi there".into()),
            &EngineConfig::default(),
        )
        .unwrap();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender, Sender::Other("Bob".into()));
        assert_eq!(messages[0].content, "Hi there");
        assert_eq!(messages[0].timestamp.as_deref(), Some("10:00"));
    }

    #[test]
    fn layout_without_classifiable_lines_falls_back_to_free_text() {
        // Every line is centered (dead zone), but the raw text happens to be
        // a well-formed transcript.
        let tokens = vec![
            tok("**Bob**", 450.0, 300.0, 100.0, (1, 1, 1), 1),
            tok("10:00", 400.0, 360.0, 60.0, (1, 1, 2), 1),
            tok("—", 465.0, 360.0, 10.0, (1, 1, 2), 2),
            tok("Hi", 480.0, 360.0, 30.0, (1, 1, 2), 3),
            tok("there", 515.0, 360.0, 50.0, (1, 1, 2), 4),
        ];

        let messages =
            reconstruct(&ctx(), ParseStrategy::Layout(tokens), &EngineConfig::default()).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender, Sender::Other("Bob".into()));
        assert_eq!(messages[0].content, "Hi there");
    }

    #[test]
    fn unparseable_content_yields_no_messages_error() {
        let tokens = vec![tok("…", 450.0, 300.0, 100.0, (1, 1, 1), 1)];
        let result = reconstruct(&ctx(), ParseStrategy::Layout(tokens), &EngineConfig::default());
        assert!(matches!(result, Err(ReconstructError::NoMessages)));
    }

    #[test]
    fn empty_free_text_yields_no_messages_error() {
        let result = reconstruct(
            &ctx(),
            ParseStrategy::FreeText(String::new()),
            &EngineConfig::default(),
        );
        assert!(matches!(result, Err(ReconstructError::NoMessages)));
    }
}
