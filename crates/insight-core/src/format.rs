//! Highlight formats.
//!
//! The highlighter only ever hands a [`FormatId`] to the host document, so formats are matched by
//! identity when they are removed again. [`InsightFormat`] describes how a renderer should draw
//! a given id.

use serde::{Deserialize, Serialize};

/// Format identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FormatId(pub u32);

/// Format used for user notes.
pub const NOTE_FORMAT_ID: FormatId = FormatId(0x0500_0001);
/// Format used for spelling findings.
pub const SPELLING_FORMAT_ID: FormatId = FormatId(0x0500_0002);
/// Format used for grammar findings.
pub const GRAMMAR_FORMAT_ID: FormatId = FormatId(0x0500_0003);
/// Format used for typography findings.
pub const TYPOGRAPHY_FORMAT_ID: FormatId = FormatId(0x0500_0004);

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Underline decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UnderlineStyle {
    /// No underline.
    #[default]
    None,
    /// Straight single underline.
    Single,
    /// Wavy underline (the usual "squiggle").
    Wave,
}

/// Visual description of a highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InsightFormat {
    /// Identity used when applying/removing the format.
    pub id: FormatId,
    /// Underline style.
    pub underline: UnderlineStyle,
    /// Underline color, if underlined.
    pub underline_color: Option<Rgb>,
    /// Background fill.
    pub background: Option<Rgb>,
}

impl InsightFormat {
    const fn wave(id: FormatId, color: Rgb) -> Self {
        Self {
            id,
            underline: UnderlineStyle::Wave,
            underline_color: Some(color),
            background: None,
        }
    }
}

/// Light green background.
pub const NOTE_FORMAT: InsightFormat = InsightFormat {
    id: NOTE_FORMAT_ID,
    underline: UnderlineStyle::None,
    underline_color: None,
    background: Some(Rgb(180, 255, 145)),
};

/// Red squiggle.
pub const SPELLING_FORMAT: InsightFormat = InsightFormat::wave(SPELLING_FORMAT_ID, Rgb(255, 0, 0));

/// Blue squiggle.
pub const GRAMMAR_FORMAT: InsightFormat = InsightFormat::wave(GRAMMAR_FORMAT_ID, Rgb(0, 0, 255));

/// Purple squiggle.
pub const TYPOGRAPHY_FORMAT: InsightFormat =
    InsightFormat::wave(TYPOGRAPHY_FORMAT_ID, Rgb(130, 0, 180));

/// A format applied to part of one paragraph (paragraph-relative character offsets).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormatSpan {
    /// Start offset within the paragraph.
    pub start: usize,
    /// Length in characters.
    pub len: usize,
    /// Applied format.
    pub format: FormatId,
}

impl FormatSpan {
    /// Create a new span.
    pub fn new(start: usize, len: usize, format: FormatId) -> Self {
        Self { start, len, format }
    }

    /// Exclusive end offset within the paragraph.
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Check if the span covers a paragraph-relative offset.
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end()
    }
}
