//! Core data types for conversation reconstruction.

use serde::{Deserialize, Serialize};

/// One recognized word/symbol plus its bounding box and confidence.
///
/// Produced by the recognition backend; never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    pub block_index: u32,
    pub paragraph_index: u32,
    pub line_index: u32,
    pub word_index: u32,
}

impl Token {
    /// Bottom edge of the token's bounding box.
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Layout sort key: reading order as reported by the recognizer.
    pub fn layout_key(&self) -> (u32, u32, u32, u32) {
        (
            self.block_index,
            self.paragraph_index,
            self.line_index,
            self.word_index,
        )
    }
}

/// A clustered run of tokens representing one visual row of text.
///
/// Transient: built by the clusterer, consumed by normalization, never stored.
#[derive(Debug, Clone)]
pub struct Line {
    pub tokens: Vec<Token>,
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    pub raw_text: String,
}

impl Line {
    /// Horizontal center of the line's bounding box.
    pub fn center(&self) -> f32 {
        self.left + self.width / 2.0
    }
}

/// Who sent a message. `You` is the local participant (right-aligned
/// bubbles); `Other` carries the resolved display name of the remote one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Sender {
    You,
    Other(String),
}

impl Sender {
    /// The display string stored and served for this sender.
    pub fn name(&self) -> &str {
        match self {
            Sender::You => "You",
            Sender::Other(name) => name,
        }
    }
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// Senders travel as plain strings on the wire; the enum is an internal
// convenience, not a serialization format.
impl Serialize for Sender {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Sender {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == "You" {
            Ok(Sender::You)
        } else {
            Ok(Sender::Other(raw))
        }
    }
}

/// One reconstructed chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub content: String,
    /// `HH:MM` as it appeared on screen, when one was visible.
    pub timestamp: Option<String>,
    /// Within-image ordering: vertical top for layout-derived messages,
    /// sequence index for free-text ones. Not part of message identity.
    #[serde(skip)]
    pub order_key: f32,
}

impl Message {
    pub fn new(
        sender: Sender,
        content: impl Into<String>,
        timestamp: Option<String>,
        order_key: f32,
    ) -> Self {
        Self {
            sender,
            content: content.into(),
            timestamp,
            order_key,
        }
    }

    /// Duplicate detection identity: exact sender and content equality.
    /// Timestamps and ordering are deliberately excluded.
    pub fn is_duplicate_of(&self, other: &Message) -> bool {
        self.sender == other.sender && self.content == other.content
    }
}

/// Per-image context the engine needs alongside the recognized payload.
#[derive(Debug, Clone)]
pub struct FrameContext {
    pub image_width: f32,
    pub image_height: f32,
    /// Display name resolved for the non-local participant.
    pub other_speaker: String,
}

impl FrameContext {
    pub fn new(image_width: u32, image_height: u32, other_speaker: impl Into<String>) -> Self {
        Self {
            image_width: image_width as f32,
            image_height: image_height as f32,
            other_speaker: other_speaker.into(),
        }
    }
}

/// Which parsing strategy the recognized payload supports.
///
/// Layout geometry is preferred; free text is the lower-confidence path used
/// when no per-token geometry exists.
#[derive(Debug, Clone)]
pub enum ParseStrategy {
    Layout(Vec<Token>),
    FreeText(String),
}

/// A rectangle in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn right(&self) -> u32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.top + self.height
    }
}
