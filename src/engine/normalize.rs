//! Line normalization strips chat chrome out of clustered line text.
//!
//! Recognized lines carry more than the message body: inline timestamps,
//! delivery checkmarks (either real glyphs or the "v"/"vv" shapes OCR makes
//! of them), and echoes of the speaker names the UI prints above bubbles.
//! Normalization removes the noise and flags pure speaker-label lines so
//! they are dropped instead of becoming messages.

use regex::Regex;

/// Cleans raw line text and extracts display timestamps.
pub struct LineNormalizer {
    time_re: Regex,
    time_capture_re: Regex,
    checkmark_re: Regex,
    read_marker_re: Regex,
}

impl LineNormalizer {
    pub fn new() -> Self {
        Self {
            time_re: Regex::new(r"\b\d{1,2}:\d{2}\b").unwrap(),
            time_capture_re: Regex::new(r"\b(\d{1,2}:\d{2})\b").unwrap(),
            checkmark_re: Regex::new(r"[✓✔]{1,2}\s*$").unwrap(),
            read_marker_re: Regex::new(r"\s+[vV][vV]?\s*$").unwrap(),
        }
    }

    /// Clean a raw line into displayable message content.
    ///
    /// Returns `None` when the line should be dropped: nothing left after
    /// cleanup, a single character, or a pure speaker-label echo.
    pub fn normalize(&self, raw: &str, other_name: &str) -> Option<String> {
        let cleaned = self.clean(raw);
        if cleaned.chars().count() <= 1 {
            return None;
        }
        if self.is_speaker_label(&cleaned, other_name) {
            return None;
        }
        Some(cleaned)
    }

    /// First `HH:MM` in the raw line, independent of content cleanup.
    pub fn timestamp(&self, raw: &str) -> Option<String> {
        self.time_capture_re
            .captures(raw)
            .map(|c| c[1].to_string())
    }

    fn clean(&self, raw: &str) -> String {
        let text = self.time_re.replace_all(raw, "");
        let text = self.checkmark_re.replace(text.trim(), "");
        let text = self.read_marker_re.replace(text.trim(), "");
        text.trim_matches(edge_noise).to_string()
    }

    /// A short line that is just the speaker's name (or "You") printed by
    /// the chat UI, not something anyone typed.
    fn is_speaker_label(&self, cleaned: &str, other_name: &str) -> bool {
        let lower = cleaned.to_lowercase();
        let len = cleaned.chars().count();
        if len < other_name.chars().count() + 5 && lower.contains(&other_name.to_lowercase()) {
            return true;
        }
        len < 6 && lower == "you"
    }
}

impl Default for LineNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Characters stripped from both ends of cleaned text.
pub(crate) fn edge_noise(c: char) -> bool {
    c.is_whitespace() || c.is_ascii_punctuation() || matches!(c, '✓' | '✔')
}
