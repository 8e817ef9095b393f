//! Anchored ranges
//!
//! An [`AnchoredRange`] is a `[left, right)` span over the document whose endpoints follow the
//! text as it is edited. Every edit is folded in through the pure [`transform_position`]
//! function, so the update rule can be tested on its own and never depends on cached state.
//!
//! # Update rule
//!
//! For an edit at `p` that removes `n` characters and adds `a`:
//!
//! - positions before `p` are unchanged;
//! - positions at `p`, or strictly inside the removed text, clamp to the edit boundary: `p` for a
//!   [`Attachment::Left`] endpoint, `p + a` for a [`Attachment::Right`] one;
//! - positions at or after `p + n` shift by `a - n`.
//!
//! With the default attachments a range whose text is entirely removed has its endpoints cross
//! (left at `p + a`, right at `p`); the range then collapses instead of spanning the new text.
//!
//! When an edit leaves the range empty, [`RangeUpdate::collapsed`] is set. That flag is the
//! collapse event the insight index reacts to.

use crate::delta::ContentsChange;
use crate::document::ParagraphLayout;
use thiserror::Error;

/// Which side of an edit boundary an endpoint sticks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attachment {
    /// Stay before text inserted exactly at the endpoint.
    Left,
    /// Move past text inserted exactly at the endpoint.
    Right,
}

/// Requested span lies outside the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("range {left}..{right} is outside the document (length {len})")]
pub struct RangeError {
    /// Requested left endpoint.
    pub left: usize,
    /// Requested right endpoint.
    pub right: usize,
    /// Document length at the time of the request.
    pub len: usize,
}

/// Recompute one position after an edit.
pub fn transform_position(pos: usize, attachment: Attachment, change: &ContentsChange) -> usize {
    let p = change.position;
    if pos < p {
        return pos;
    }
    if pos == p || pos < change.removed_end() {
        return match attachment {
            Attachment::Left => p,
            Attachment::Right => change.added_end(),
        };
    }
    pos - change.removed + change.added
}

/// Recompute a `(left, right)` pair after an edit.
///
/// Endpoints that cross (every character of the range was removed) collapse onto the left
/// endpoint's new position.
pub fn transform_range(
    (left, right): (usize, usize),
    (left_attachment, right_attachment): (Attachment, Attachment),
    change: &ContentsChange,
) -> (usize, usize) {
    let left = transform_position(left, left_attachment, change);
    let right = transform_position(right, right_attachment, change);
    if left > right {
        return (left, left);
    }
    (left, right)
}

/// Outcome of folding one edit into an [`AnchoredRange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeUpdate {
    /// Range before the edit.
    pub before: (usize, usize),
    /// Range after the edit.
    pub after: (usize, usize),
    /// The edit was adjacent to or inside the range.
    pub touched: bool,
    /// The edit left the range empty.
    pub collapsed: bool,
}

impl RangeUpdate {
    /// Returns `true` if the range moved or resized.
    pub fn changed(&self) -> bool {
        self.before != self.after
    }
}

/// A span whose endpoints follow document edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchoredRange {
    left: usize,
    right: usize,
    left_attachment: Attachment,
    right_attachment: Attachment,
}

impl AnchoredRange {
    /// Create a range over a document of `len` characters.
    ///
    /// Reversed endpoints are swapped. Fails if either endpoint lies past `len`.
    pub fn new(left: usize, right: usize, len: usize) -> Result<Self, RangeError> {
        let (left, right) = validate(left, right, len)?;
        Ok(Self {
            left,
            right,
            left_attachment: Attachment::Right,
            right_attachment: Attachment::Left,
        })
    }

    /// Override the attachment sides of both endpoints.
    pub fn with_attachment(mut self, left: Attachment, right: Attachment) -> Self {
        self.left_attachment = left;
        self.right_attachment = right;
        self
    }

    /// Move the range. Same validation as [`AnchoredRange::new`]; on error nothing changes.
    pub fn set_range(&mut self, left: usize, right: usize, len: usize) -> Result<(), RangeError> {
        let (left, right) = validate(left, right, len)?;
        self.left = left;
        self.right = right;
        Ok(())
    }

    /// `(left, right)`, normalized.
    pub fn range(&self) -> (usize, usize) {
        (self.left, self.right)
    }

    /// Left endpoint.
    pub fn left(&self) -> usize {
        self.left
    }

    /// Right endpoint (exclusive).
    pub fn right(&self) -> usize {
        self.right
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.right - self.left
    }

    /// Returns `true` if the range is empty.
    pub fn is_empty(&self) -> bool {
        self.left == self.right
    }

    /// Alias of [`AnchoredRange::is_empty`] in collapse terminology.
    pub fn is_collapsed(&self) -> bool {
        self.is_empty()
    }

    /// Attachment sides of `(left, right)`.
    pub fn attachment(&self) -> (Attachment, Attachment) {
        (self.left_attachment, self.right_attachment)
    }

    /// Check if `offset` lies inside the range.
    pub fn contains(&self, offset: usize) -> bool {
        self.left <= offset && offset < self.right
    }

    /// First and last paragraph holding at least one character of the range.
    ///
    /// An empty range reports the paragraph of its position.
    pub fn paragraphs(&self, layout: &dyn ParagraphLayout) -> (usize, usize) {
        let first = layout.paragraph_at(self.left);
        if self.is_empty() {
            return (first, first);
        }
        (first, layout.paragraph_at(self.right - 1).max(first))
    }

    /// Fold one edit into the range.
    pub fn apply_change(&mut self, change: &ContentsChange) -> RangeUpdate {
        let before = self.range();
        let touched = change.position <= self.right && change.removed_end() >= self.left;
        let after = transform_range(before, self.attachment(), change);
        self.left = after.0;
        self.right = after.1;
        RangeUpdate {
            before,
            after,
            touched,
            collapsed: touched && after.0 == after.1,
        }
    }
}

fn validate(left: usize, right: usize, len: usize) -> Result<(usize, usize), RangeError> {
    let (left, right) = (left.min(right), left.max(right));
    if right > len {
        return Err(RangeError { left, right, len });
    }
    Ok((left, right))
}
