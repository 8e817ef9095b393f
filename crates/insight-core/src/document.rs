//! Host document
//!
//! A rope-backed text buffer split into paragraphs (rope lines), plus the per-paragraph format
//! storage a renderer draws from. The insight index only talks to it through the narrow
//! [`ParagraphLayout`] and [`FormatSink`] traits, so any host that can map offsets to paragraphs
//! and stack formats by identity can stand in for it.

use crate::delta::ContentsChange;
use crate::format::{FormatId, FormatSpan};
use ropey::{Rope, RopeSlice};
use std::iter;
use std::ops::Range;
use thiserror::Error;
use tracing::trace;

/// Position-to-paragraph mapping of a text buffer.
pub trait ParagraphLayout {
    /// Total length in characters.
    fn len_chars(&self) -> usize;

    /// Number of paragraphs (an empty document has one).
    fn paragraph_count(&self) -> usize;

    /// Paragraph containing `offset` (clamped to the document length).
    fn paragraph_at(&self, offset: usize) -> usize;

    /// Character offset of the first character of `paragraph`.
    fn paragraph_start(&self, paragraph: usize) -> usize;

    /// Length of `paragraph` in characters, excluding its line break.
    fn paragraph_len(&self, paragraph: usize) -> usize;

    /// First and last paragraph touched by `[left, right]`.
    fn paragraphs_of(&self, left: usize, right: usize) -> (usize, usize) {
        (self.paragraph_at(left), self.paragraph_at(right))
    }
}

/// Receiver of highlight formats, matched by format identity.
pub trait FormatSink {
    /// Apply `format` to `len` characters starting at paragraph-relative `start`.
    fn apply_format(&mut self, paragraph: usize, start: usize, len: usize, format: FormatId);

    /// Remove one application previously made with the exact same arguments.
    ///
    /// Returns `false` if no such application exists.
    fn remove_format(&mut self, paragraph: usize, start: usize, len: usize, format: FormatId)
    -> bool;
}

/// Text edit errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EditError {
    /// Offset lies past the end of the document.
    #[error("invalid offset: {0}")]
    InvalidOffset(usize),
    /// Range is not contained in the document.
    #[error("invalid range: {start}..{end}")]
    InvalidRange {
        /// Inclusive start character offset.
        start: usize,
        /// Exclusive end character offset.
        end: usize,
    },
}

/// A plain-text document with per-paragraph format storage.
#[derive(Debug, Clone)]
pub struct Document {
    rope: Rope,
    /// Formats of each paragraph, paragraph-relative.
    formats: Vec<Vec<FormatSpan>>,
    /// Incremented on every effective edit.
    revision: u64,
}

impl Document {
    /// Create a document from text.
    pub fn new(text: &str) -> Self {
        let rope = Rope::from_str(text);
        let formats = iter::repeat_with(Vec::new).take(rope.len_lines()).collect();
        Self {
            rope,
            formats,
            revision: 0,
        }
    }

    /// Create an empty document.
    pub fn empty() -> Self {
        Self::new("")
    }

    /// Complete text.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Text of `[start, end)`, if valid.
    pub fn slice(&self, start: usize, end: usize) -> Option<String> {
        if start > end || end > self.rope.len_chars() {
            return None;
        }
        Some(self.rope.slice(start..end).to_string())
    }

    /// Text of a paragraph, without its line break.
    pub fn paragraph_text(&self, paragraph: usize) -> Option<String> {
        if paragraph >= self.rope.len_lines() {
            return None;
        }
        let line = self.rope.line(paragraph);
        Some(line.slice(..content_len(line)).to_string())
    }

    /// Character range of a paragraph's content.
    pub fn paragraph_range(&self, paragraph: usize) -> Range<usize> {
        let start = self.paragraph_start(paragraph);
        start..start + self.paragraph_len(paragraph)
    }

    /// Edit revision (number of effective edits so far).
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Insert `text` at `offset`.
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<ContentsChange, EditError> {
        self.replace(offset, 0, text)
    }

    /// Remove `len` characters starting at `offset`.
    pub fn remove(&mut self, offset: usize, len: usize) -> Result<ContentsChange, EditError> {
        self.replace(offset, len, "")
    }

    /// Replace `len` characters starting at `offset` by `text`.
    pub fn replace(
        &mut self,
        offset: usize,
        len: usize,
        text: &str,
    ) -> Result<ContentsChange, EditError> {
        let total = self.rope.len_chars();
        if offset > total {
            return Err(EditError::InvalidOffset(offset));
        }
        let end = offset
            .checked_add(len)
            .filter(|end| *end <= total)
            .ok_or(EditError::InvalidRange {
                start: offset,
                end: offset.saturating_add(len),
            })?;

        let added = text.chars().count();
        let line_before = self.rope.char_to_line(offset);
        let old_last = self.rope.char_to_line(end);

        if len == 0 && added == 0 {
            return Ok(ContentsChange {
                position: offset,
                removed: 0,
                added: 0,
                first_paragraph: line_before,
                removed_paragraphs: 1,
                added_paragraphs: 1,
            });
        }

        if len > 0 {
            self.rope.remove(offset..end);
        }
        if added > 0 {
            self.rope.insert(offset, text);
        }
        // A `\r` before `offset` and a `\n` after the edit may now form one break, pulling the
        // edit into the preceding line.
        let first_paragraph = line_before.min(self.rope.char_to_line(offset));
        let new_last = self.rope.char_to_line(offset + added);

        let change = ContentsChange {
            position: offset,
            removed: len,
            added,
            first_paragraph,
            removed_paragraphs: old_last - first_paragraph + 1,
            added_paragraphs: new_last - first_paragraph + 1,
        };

        // Edited paragraphs lose their formats; everything else is paragraph-relative and stays.
        let old = change.old_paragraphs();
        let old = old.start.min(self.formats.len())..old.end.min(self.formats.len());
        self.formats.splice(
            old,
            iter::repeat_with(Vec::new).take(change.added_paragraphs),
        );
        self.formats.resize_with(self.rope.len_lines(), Vec::new);
        self.revision += 1;

        trace!(
            position = change.position,
            removed = change.removed,
            added = change.added,
            revision = self.revision,
            "document edited"
        );
        Ok(change)
    }

    /// Formats currently applied to a paragraph.
    pub fn formats(&self, paragraph: usize) -> &[FormatSpan] {
        self.formats
            .get(paragraph)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Format ids covering the character at `offset`.
    pub fn formats_at(&self, offset: usize) -> Vec<FormatId> {
        if offset >= self.rope.len_chars() {
            return Vec::new();
        }
        let paragraph = self.paragraph_at(offset);
        let relative = offset - self.paragraph_start(paragraph);
        self.formats(paragraph)
            .iter()
            .filter(|span| span.contains(relative))
            .map(|span| span.format)
            .collect()
    }

    /// Total number of format applications across all paragraphs.
    pub fn format_count(&self) -> usize {
        self.formats.iter().map(Vec::len).sum()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}

impl ParagraphLayout for Document {
    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn paragraph_count(&self) -> usize {
        self.rope.len_lines()
    }

    fn paragraph_at(&self, offset: usize) -> usize {
        self.rope.char_to_line(offset.min(self.rope.len_chars()))
    }

    fn paragraph_start(&self, paragraph: usize) -> usize {
        if paragraph >= self.rope.len_lines() {
            return self.rope.len_chars();
        }
        self.rope.line_to_char(paragraph)
    }

    fn paragraph_len(&self, paragraph: usize) -> usize {
        if paragraph >= self.rope.len_lines() {
            return 0;
        }
        content_len(self.rope.line(paragraph))
    }
}

impl FormatSink for Document {
    fn apply_format(&mut self, paragraph: usize, start: usize, len: usize, format: FormatId) {
        if let Some(spans) = self.formats.get_mut(paragraph) {
            spans.push(FormatSpan::new(start, len, format));
        }
    }

    fn remove_format(
        &mut self,
        paragraph: usize,
        start: usize,
        len: usize,
        format: FormatId,
    ) -> bool {
        let Some(spans) = self.formats.get_mut(paragraph) else {
            return false;
        };
        let target = FormatSpan::new(start, len, format);
        match spans.iter().position(|span| *span == target) {
            Some(pos) => {
                spans.remove(pos);
                true
            }
            None => false,
        }
    }
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}'
    )
}

/// Length of a rope line without its trailing line break (`\r\n` counts as one break).
fn content_len(line: RopeSlice<'_>) -> usize {
    let mut len = line.len_chars();
    if len > 0 && is_line_break(line.char(len - 1)) {
        let last = line.char(len - 1);
        len -= 1;
        if last == '\n' && len > 0 && line.char(len - 1) == '\r' {
            len -= 1;
        }
    }
    len
}
