//! Free-text transcript parsing, the no-geometry fallback path.
//!
//! Vision models asked to transcribe a chat produce a loosely structured
//! format: a sender header (usually `**Name**`, sometimes a bare name line),
//! followed by one message per line as `HH:MM — content` with assorted dash
//! characters. This parser walks that shape line by line, tracking the
//! current sender; content lines arriving before any sender are dropped.

use regex::Regex;
use tracing::debug;

use crate::engine::types::{Message, Sender};

/// Characters accepted as the timestamp/content separator.
const DASH_SEPARATORS: [char; 3] = ['—', '–', '-'];

/// Parses model-formatted conversation transcripts into messages.
pub struct FreeTextParser {
    bare_name_re: Regex,
    bold_name_re: Regex,
    message_re: Regex,
}

impl FreeTextParser {
    pub fn new() -> Self {
        Self {
            bare_name_re: Regex::new(r"^[A-Za-z0-9\s]+$").unwrap(),
            bold_name_re: Regex::new(r"^\*\*([^*]+)\*\*").unwrap(),
            message_re: Regex::new(r"^(\d{1,2}:\d{2})?\s*(?:—|-|–)?\s*(.+)$").unwrap(),
        }
    }

    /// Parse one free-form text block into ordered messages.
    pub fn parse(&self, text: &str) -> Vec<Message> {
        let lines: Vec<&str> = text.trim().split('\n').collect();
        let mut messages: Vec<Message> = Vec::new();
        let mut current_sender: Option<String> = None;

        for (i, raw_line) in lines.iter().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            // A bare alphanumeric line is a sender header when the next line
            // carries a dash separator; otherwise it is ordinary content.
            if i + 1 < lines.len()
                && self.bare_name_re.is_match(line)
                && lines[i + 1].contains(DASH_SEPARATORS)
            {
                current_sender = Some(line.to_string());
                continue;
            }

            if let Some(caps) = self.bold_name_re.captures(line) {
                current_sender = Some(caps[1].trim().to_string());
                continue;
            }

            let Some(sender) = current_sender.as_deref() else {
                debug!(line, "Dropping content line with no sender in scope");
                continue;
            };

            if let Some(caps) = self.message_re.captures(line) {
                let timestamp = caps.get(1).map(|m| m.as_str().to_string());
                let content = caps[2].trim();
                if !content.is_empty() {
                    messages.push(Message::new(
                        sender_for(sender),
                        content,
                        timestamp,
                        messages.len() as f32,
                    ));
                }
            }
        }

        debug!(messages = messages.len(), "Parsed free-text transcript");
        messages
    }
}

impl Default for FreeTextParser {
    fn default() -> Self {
        Self::new()
    }
}

fn sender_for(name: &str) -> Sender {
    if name == "You" {
        Sender::You
    } else {
        Sender::Other(name.to_string())
    }
}
