//! # Envelope Codec
//!
//! Decomposes raw netmail text into header tag-lines, a text body and
//! footer tag-lines, and reassembles them.
//!
//! ## Framing
//!
//! Lines are separated by `\r`. A line starting with `\x01` (SOH) is a
//! tag-line ("kludge"). Tag-lines before the first text line belong to the
//! header; the first tag-line after text has begun opens the footer and
//! closes the body for good.
//!
//! ## Lossy Rule
//!
//! Once the footer has opened, any further plain-text line is dropped.
//! Existing message stores depend on this framing, so it is reproduced
//! exactly rather than repaired.

use crate::domain::errors::EnvelopeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Internal line separator.
pub const LINE_SEPARATOR: char = '\r';

/// End-of-line used for human editing.
pub const DISPLAY_SEPARATOR: char = '\n';

/// Reserved control character prefixing every tag-line.
pub const TAG_MARKER: char = '\x01';

const SEPARATOR_STR: &str = "\r";

/// Which tag sequence of an envelope an operation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagArea {
    Header,
    Footer,
}

impl fmt::Display for TagArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagArea::Header => f.write_str("header"),
            TagArea::Footer => f.write_str("footer"),
        }
    }
}

impl FromStr for TagArea {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "header" => Ok(TagArea::Header),
            "footer" => Ok(TagArea::Footer),
            _ => Err(EnvelopeError::UnknownArea(s.to_string())),
        }
    }
}

/// Parsed representation of one message.
///
/// Header and footer entries are stored without the tag marker and never
/// contain [`LINE_SEPARATOR`]. The body keeps `\r` as its line separator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Envelope {
    header: Vec<String>,
    body: String,
    footer: Vec<String>,
}

impl Envelope {
    /// Decode raw message text.
    ///
    /// Empty input yields an envelope with an empty body and no tags.
    pub fn decode(raw: &str) -> Self {
        let mut header = Vec::new();
        let mut footer = Vec::new();
        let mut body_lines: Vec<&str> = Vec::new();
        let mut body_started = false;
        let mut footer_locked = false;

        for line in raw.split(LINE_SEPARATOR) {
            if let Some(tag) = line.strip_prefix(TAG_MARKER) {
                if body_started {
                    footer_locked = true;
                    footer.push(tag.to_string());
                } else {
                    header.push(tag.to_string());
                }
            } else if !footer_locked {
                body_started = true;
                body_lines.push(line);
            }
            // Plain text after the footer opened is discarded.
        }

        Self {
            header,
            body: body_lines.join(SEPARATOR_STR),
            footer,
        }
    }

    /// Decode raw message bytes, which must be valid UTF-8.
    pub fn decode_bytes(raw: &[u8]) -> Result<Self, EnvelopeError> {
        let text = std::str::from_utf8(raw)
            .map_err(|e| EnvelopeError::Format(format!("not valid UTF-8: {e}")))?;
        Ok(Self::decode(text))
    }

    /// Build a tag-free envelope from display text.
    pub fn from_text(text: &str) -> Self {
        let mut envelope = Self::default();
        envelope.set_display_text(text);
        envelope
    }

    /// Reassemble the raw message text.
    ///
    /// Empty header or footer segments still contribute an empty string
    /// between separators, so `encode(decode(x))` equals `x` only when both
    /// tag areas are non-empty.
    pub fn encode(&self) -> String {
        [
            encode_tags(&self.header),
            self.body.clone(),
            encode_tags(&self.footer),
        ]
        .join(SEPARATOR_STR)
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn footer(&self) -> &[String] {
        &self.footer
    }

    /// Body text using the internal separator.
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    /// Body text with conventional end-of-line characters.
    pub fn display_text(&self) -> String {
        self.body.replace(LINE_SEPARATOR, "\n")
    }

    /// Replace the body from display text.
    ///
    /// `\r\n` pairs fold to a single separator.
    pub fn set_display_text(&mut self, text: &str) {
        self.body = text
            .replace("\r\n", "\n")
            .replace(DISPLAY_SEPARATOR, SEPARATOR_STR);
    }

    /// All tag-lines, header first, in stored order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.header
            .iter()
            .chain(self.footer.iter())
            .map(String::as_str)
    }

    /// Value of the last `NAME: VALUE` tag-line named `name`, scanning
    /// header then footer.
    pub fn last_tag_value(&self, name: &str) -> Option<&str> {
        self.tags().filter_map(|tag| tag_value(tag, name)).last()
    }

    /// Append a tag-line to `area`.
    pub fn add_tag(&mut self, area: TagArea, text: &str) -> Result<(), EnvelopeError> {
        if text.is_empty() {
            return Err(EnvelopeError::EmptyTag);
        }
        if text.contains(LINE_SEPARATOR) {
            return Err(EnvelopeError::MultiLineTag);
        }
        self.area_mut(area).push(text.to_string());
        Ok(())
    }

    /// Remove every tag-line in `area` named `name_prefix`, either bare or
    /// as `name_prefix: ...`. Returns how many lines were removed.
    pub fn remove_tag(&mut self, area: TagArea, name_prefix: &str) -> Result<usize, EnvelopeError> {
        if name_prefix.is_empty() {
            return Err(EnvelopeError::EmptyTag);
        }
        let tags = self.area_mut(area);
        let before = tags.len();
        tags.retain(|tag| !tag_matches(tag, name_prefix));
        Ok(before - tags.len())
    }

    fn area_mut(&mut self, area: TagArea) -> &mut Vec<String> {
        match area {
            TagArea::Header => &mut self.header,
            TagArea::Footer => &mut self.footer,
        }
    }
}

fn encode_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| format!("{TAG_MARKER}{tag}"))
        .collect::<Vec<_>>()
        .join(SEPARATOR_STR)
}

fn tag_matches(tag: &str, name: &str) -> bool {
    tag == name || tag_value(tag, name).is_some()
}

/// Value part of `tag` when it reads `name: VALUE`.
fn tag_value<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    tag.strip_prefix(name)?.strip_prefix(": ")
}
