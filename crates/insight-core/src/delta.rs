//! Structured edit notifications.
//!
//! Every mutation of a [`Document`](crate::Document) yields one [`ContentsChange`], expressed in
//! **character offsets** (Unicode scalar values). Consumers that keep positions into the text
//! (anchored ranges, highlighter paragraph state) recompute themselves from it before the next
//! highlighting pass.

use std::ops::Range;

/// A single contiguous edit.
///
/// Semantics:
/// - `position` is the character offset where the edit happened.
/// - `removed` characters starting at `position` were deleted from the old text.
/// - `added` characters were inserted at `position` in the new text.
/// - The paragraph fields describe which paragraphs the edit replaced: old paragraphs
///   `first_paragraph..first_paragraph + removed_paragraphs` became new paragraphs
///   `first_paragraph..first_paragraph + added_paragraphs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentsChange {
    /// Start character offset of the edit.
    pub position: usize,
    /// Number of characters removed.
    pub removed: usize,
    /// Number of characters added.
    pub added: usize,
    /// First paragraph touched by the edit.
    pub first_paragraph: usize,
    /// Number of old paragraphs replaced by the edit (at least 1).
    pub removed_paragraphs: usize,
    /// Number of new paragraphs produced by the edit (at least 1).
    pub added_paragraphs: usize,
}

impl ContentsChange {
    /// A change without paragraph bookkeeping (edit within a single paragraph).
    ///
    /// Mostly useful for exercising position transforms in isolation.
    pub fn new(position: usize, removed: usize, added: usize) -> Self {
        Self {
            position,
            removed,
            added,
            first_paragraph: 0,
            removed_paragraphs: 1,
            added_paragraphs: 1,
        }
    }

    /// Pure insertion.
    pub fn insertion(position: usize, added: usize) -> Self {
        Self::new(position, 0, added)
    }

    /// Pure deletion.
    pub fn deletion(position: usize, removed: usize) -> Self {
        Self::new(position, removed, 0)
    }

    /// Exclusive end of the removed text in the old document.
    pub fn removed_end(&self) -> usize {
        self.position + self.removed
    }

    /// Exclusive end of the added text in the new document.
    pub fn added_end(&self) -> usize {
        self.position + self.added
    }

    /// Net change in document length.
    pub fn delta(&self) -> isize {
        self.added as isize - self.removed as isize
    }

    /// Paragraphs of the new document produced by this edit.
    pub fn new_paragraphs(&self) -> Range<usize> {
        self.first_paragraph..self.first_paragraph + self.added_paragraphs
    }

    /// Paragraphs of the old document replaced by this edit.
    pub fn old_paragraphs(&self) -> Range<usize> {
        self.first_paragraph..self.first_paragraph + self.removed_paragraphs
    }

    /// Returns `true` if the edit changed nothing.
    pub fn is_empty(&self) -> bool {
        self.removed == 0 && self.added == 0
    }
}
