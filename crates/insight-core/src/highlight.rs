//! Incremental per-paragraph highlighting.
//!
//! Each paragraph `P` caches an *exit pointer*: the smallest index into the sorted insight list
//! that can overlap paragraph `P + 1` or any later one. Highlighting `P + 1` starts scanning at
//! that index, so a full pass costs roughly the number of (paragraph, overlapping insight) pairs
//! instead of paragraphs × insights.
//!
//! The pointer is only a lower bound. Keeping it a lower bound across index mutations is the job
//! of `Highlighter::entry_inserted`, `Highlighter::entry_erased` and
//! `Highlighter::contents_changed`; lowering it is always safe, raising it is not.
//!
//! Paragraphs are highlighted from an ordered dirty set, strictly in increasing order. A
//! paragraph whose exit pointer changed schedules its successor.

use crate::anchor::AnchoredRange;
use crate::delta::ContentsChange;
use crate::document::{FormatSink, ParagraphLayout};
use crate::format::{FormatId, FormatSpan};
use std::collections::BTreeSet;
use std::iter;
use std::ops::RangeInclusive;
use tracing::trace;

/// Highlighting progress of one paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HighlightStatus {
    /// Never highlighted since it was created.
    #[default]
    NotStarted,
    /// A pass over this paragraph is running.
    Scanning,
    /// Highlighted; the exit pointer is valid.
    Done,
}

/// Cached highlighting state of one paragraph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParagraphState {
    /// Progress.
    pub status: HighlightStatus,
    /// Index the last pass started scanning at.
    pub scan_start: usize,
    /// Resume pointer handed to the next paragraph.
    pub exit: usize,
    /// Number of entries the last pass examined.
    pub scanned: usize,
    /// Formats the last pass applied, removed again before the next one.
    pub applied: Vec<FormatSpan>,
}

/// What the highlighter needs to know about an indexed entry.
pub(crate) trait Highlighted {
    fn anchor(&self) -> &AnchoredRange;
    fn format_id(&self) -> FormatId;
}

/// Per-paragraph highlight driver.
#[derive(Debug, Default)]
pub(crate) struct Highlighter {
    states: Vec<ParagraphState>,
    dirty: BTreeSet<usize>,
}

impl Highlighter {
    pub(crate) fn new(paragraphs: usize) -> Self {
        Self {
            states: iter::repeat_with(ParagraphState::default)
                .take(paragraphs)
                .collect(),
            dirty: BTreeSet::new(),
        }
    }

    pub(crate) fn state(&self, paragraph: usize) -> Option<&ParagraphState> {
        self.states.get(paragraph)
    }

    pub(crate) fn is_clean(&self) -> bool {
        self.dirty.is_empty()
    }

    pub(crate) fn invalidate(&mut self, paragraphs: RangeInclusive<usize>) {
        self.dirty.extend(paragraphs);
    }

    pub(crate) fn invalidate_all(&mut self) {
        self.dirty.extend(0..self.states.len());
    }

    /// Forget every resume pointer and schedule a full pass.
    pub(crate) fn reset(&mut self) {
        for state in &mut self.states {
            state.status = HighlightStatus::NotStarted;
            state.exit = 0;
        }
        self.invalidate_all();
    }

    /// An entry was inserted at `index`, covering paragraphs `first..=last`.
    pub(crate) fn entry_inserted(&mut self, index: usize, first: usize, last: usize) {
        for (paragraph, state) in self.states.iter_mut().enumerate() {
            // An exit equal to `index` now names the new entry. Below `last` the exit seeds a
            // paragraph at or before `last`, which may still have to scan the entry; from `last`
            // on the next paragraph lies past the entry and the pointer moves over it.
            if state.exit > index || (state.exit == index && paragraph >= last) {
                state.exit += 1;
            }
            if state.scan_start > index {
                state.scan_start += 1;
            }
        }
        // Paragraphs first + 1..=last must now start no later than the new entry.
        let end = last.min(self.states.len());
        for state in self.states.get_mut(first..end).into_iter().flatten() {
            state.exit = state.exit.min(index);
        }
        self.invalidate(first..=last);
    }

    /// The entry at `index`, which covered paragraphs `first..=last`, was erased.
    pub(crate) fn entry_erased(&mut self, index: usize, first: usize, last: usize) {
        for state in &mut self.states {
            if state.exit > index {
                state.exit -= 1;
            }
            if state.scan_start > index {
                state.scan_start -= 1;
            }
        }
        self.invalidate(first..=last);
    }

    /// The entry at `index` now covers paragraphs `first..=last` without having moved.
    pub(crate) fn entry_extended(&mut self, index: usize, first: usize, last: usize) {
        let end = last.min(self.states.len());
        let start = first.saturating_sub(1);
        for state in self.states.get_mut(start..end).into_iter().flatten() {
            state.exit = state.exit.min(index);
        }
        self.invalidate(first..=last);
    }

    /// Splice paragraph states to follow a document edit.
    ///
    /// States of the rewritten paragraphs are dropped together with their applied formats: the
    /// host is expected to have discarded formats of those paragraphs as well.
    pub(crate) fn contents_changed(&mut self, change: &ContentsChange, paragraphs: usize) {
        let old = change.old_paragraphs();
        let old = old.start.min(self.states.len())..old.end.min(self.states.len());
        self.states.splice(
            old,
            iter::repeat_with(ParagraphState::default).take(change.added_paragraphs),
        );
        self.states.resize_with(paragraphs, ParagraphState::default);

        // Dirty paragraphs after the edited region move with it.
        let shift = change.added_paragraphs as isize - change.removed_paragraphs as isize;
        let old_end = change.first_paragraph + change.removed_paragraphs;
        let dirty = std::mem::take(&mut self.dirty);
        self.dirty = dirty
            .into_iter()
            .filter_map(|p| {
                if p < change.first_paragraph {
                    Some(p)
                } else if p < old_end {
                    None
                } else {
                    Some(p.saturating_add_signed(shift))
                }
            })
            .filter(|p| *p < paragraphs)
            .collect();
        self.dirty.extend(change.new_paragraphs());
    }

    /// Highlight every dirty paragraph in increasing order.
    ///
    /// Returns the indices of collapsed entries found on the way. They are left in place.
    pub(crate) fn run<E, D>(&mut self, entries: &[E], doc: &mut D) -> Vec<usize>
    where
        E: Highlighted,
        D: ParagraphLayout + FormatSink,
    {
        let count = doc.paragraph_count();
        if self.states.len() != count {
            self.states.resize_with(count, ParagraphState::default);
        }

        let mut collapsed = Vec::new();
        while let Some(paragraph) = self.dirty.pop_first() {
            if paragraph >= count {
                self.dirty.clear();
                break;
            }
            let (was_started, old_exit) = {
                let state = &self.states[paragraph];
                (state.status == HighlightStatus::Done, state.exit)
            };
            self.highlight_paragraph(paragraph, entries, doc, &mut collapsed);
            let exit = self.states[paragraph].exit;
            if (!was_started || exit != old_exit) && paragraph + 1 < count {
                self.dirty.insert(paragraph + 1);
            }
        }
        collapsed.sort_unstable();
        collapsed.dedup();
        collapsed
    }

    fn highlight_paragraph<E, D>(
        &mut self,
        paragraph: usize,
        entries: &[E],
        doc: &mut D,
        collapsed: &mut Vec<usize>,
    ) where
        E: Highlighted,
        D: ParagraphLayout + FormatSink,
    {
        let start = match paragraph.checked_sub(1).map(|p| &self.states[p]) {
            Some(prev) if prev.status == HighlightStatus::Done => prev.exit.min(entries.len()),
            Some(_) | None => 0,
        };

        let state = &mut self.states[paragraph];
        state.status = HighlightStatus::Scanning;
        for span in state.applied.drain(..) {
            doc.remove_format(paragraph, span.start, span.len, span.format);
        }

        let par_start = doc.paragraph_start(paragraph);
        let par_end = par_start + doc.paragraph_len(paragraph);
        let mut next_start = None;
        let mut stop = entries.len();
        let mut scanned = 0;

        for (i, entry) in entries.iter().enumerate().skip(start) {
            scanned += 1;
            let anchor = entry.anchor();
            let (first, last) = anchor.paragraphs(&*doc);
            if first > paragraph {
                stop = i;
                break;
            }
            if anchor.is_collapsed() {
                collapsed.push(i);
                continue;
            }
            if last < paragraph {
                continue;
            }
            if last > paragraph && next_start.is_none() {
                next_start = Some(i);
            }

            let (left, right) = anchor.range();
            let from = left.max(par_start);
            let to = right.min(par_end);
            if to > from {
                let span = FormatSpan::new(from - par_start, to - from, entry.format_id());
                doc.apply_format(paragraph, span.start, span.len, span.format);
                state.applied.push(span);
            }
        }

        state.scan_start = start;
        state.exit = next_start.unwrap_or(stop);
        state.scanned = scanned;
        state.status = HighlightStatus::Done;
        trace!(
            paragraph,
            start,
            exit = state.exit,
            scanned,
            applied = state.applied.len(),
            "highlighted paragraph"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::format::NOTE_FORMAT_ID;

    struct Mark(AnchoredRange);

    impl Highlighted for Mark {
        fn anchor(&self) -> &AnchoredRange {
            &self.0
        }

        fn format_id(&self) -> FormatId {
            NOTE_FORMAT_ID
        }
    }

    fn marks(doc: &Document, ranges: &[(usize, usize)]) -> Vec<Mark> {
        ranges
            .iter()
            .map(|&(l, r)| Mark(AnchoredRange::new(l, r, doc.len_chars()).unwrap()))
            .collect()
    }

    #[test]
    fn test_multi_paragraph_entry_is_split() {
        let mut doc = Document::new("aaaa\nbbbb\ncccc");
        let entries = marks(&doc, &[(2, 12)]);
        let mut hl = Highlighter::new(doc.paragraph_count());
        hl.invalidate_all();
        assert!(hl.run(&entries, &mut doc).is_empty());

        assert_eq!(doc.formats(0), &[FormatSpan::new(2, 2, NOTE_FORMAT_ID)]);
        assert_eq!(doc.formats(1), &[FormatSpan::new(0, 4, NOTE_FORMAT_ID)]);
        assert_eq!(doc.formats(2), &[FormatSpan::new(0, 2, NOTE_FORMAT_ID)]);
        assert_eq!(hl.state(0).unwrap().exit, 0);
        assert_eq!(hl.state(1).unwrap().exit, 0);
        assert_eq!(hl.state(2).unwrap().exit, 1);
    }

    #[test]
    fn test_resume_pointer_skips_earlier_entries() {
        let mut doc = Document::new("one\ntwo\nsix");
        let entries = marks(&doc, &[(0, 3), (4, 7), (8, 11)]);
        let mut hl = Highlighter::new(doc.paragraph_count());
        hl.invalidate_all();
        hl.run(&entries, &mut doc);

        let second = hl.state(1).unwrap();
        assert_eq!(second.scan_start, 1);
        // Its own entry plus the one that stops the scan.
        assert_eq!(second.scanned, 2);
        assert_eq!(hl.state(2).unwrap().scan_start, 2);
    }

    #[test]
    fn test_rehighlight_removes_previous_formats() {
        let mut doc = Document::new("abcdef");
        let mut entries = marks(&doc, &[(0, 4)]);
        let mut hl = Highlighter::new(1);
        hl.invalidate_all();
        hl.run(&entries, &mut doc);

        entries[0].0.set_range(1, 2, 6).unwrap();
        hl.invalidate(0..=0);
        hl.run(&entries, &mut doc);
        assert_eq!(doc.formats(0), &[FormatSpan::new(1, 1, NOTE_FORMAT_ID)]);
    }

    #[test]
    fn test_collapsed_entries_are_reported_not_drawn() {
        let mut doc = Document::new("abc\ndef");
        let entries = marks(&doc, &[(1, 1), (1, 3)]);
        let mut hl = Highlighter::new(doc.paragraph_count());
        hl.invalidate_all();
        assert_eq!(hl.run(&entries, &mut doc), vec![0]);
        assert_eq!(doc.formats(0), &[FormatSpan::new(1, 2, NOTE_FORMAT_ID)]);
    }

    #[test]
    fn test_insert_keeps_pointers_that_must_scan_new_entry() {
        let mut doc = Document::new("a\nb\nc\nd");
        let mut entries = marks(&doc, &[(0, 1), (6, 7)]);
        let mut hl = Highlighter::new(doc.paragraph_count());
        hl.invalidate_all();
        hl.run(&entries, &mut doc);
        assert_eq!(hl.state(0).unwrap().exit, 1);
        assert_eq!(hl.state(2).unwrap().exit, 1);

        // New entry over paragraphs 1..=2 lands at index 1.
        entries.insert(1, Mark(AnchoredRange::new(2, 5, doc.len_chars()).unwrap()));
        hl.entry_inserted(1, 1, 2);
        assert_eq!(hl.state(0).unwrap().exit, 1);
        assert_eq!(hl.state(2).unwrap().exit, 2);
        assert_eq!(hl.state(3).unwrap().exit, 3);

        hl.run(&entries, &mut doc);
        assert_eq!(doc.formats(1), &[FormatSpan::new(0, 1, NOTE_FORMAT_ID)]);
        assert_eq!(doc.formats(2), &[FormatSpan::new(0, 1, NOTE_FORMAT_ID)]);
        assert_eq!(doc.formats(3), &[FormatSpan::new(0, 1, NOTE_FORMAT_ID)]);
        assert_eq!(hl.state(1).unwrap().scan_start, 1);
        // Paragraph 2 ends with the same exit, so paragraph 3 is not revisited.
        assert_eq!(hl.state(2).unwrap().exit, 2);
        assert!(hl.is_clean());
    }

    #[test]
    fn test_unchanged_exit_stops_cascade() {
        let mut doc = Document::new("a\nb\nc\nd");
        let entries = marks(&doc, &[(0, 1), (6, 7)]);
        let mut hl = Highlighter::new(doc.paragraph_count());
        hl.invalidate_all();
        hl.run(&entries, &mut doc);

        hl.invalidate(1..=1);
        hl.run(&entries, &mut doc);
        assert!(hl.is_clean());
        assert_eq!(hl.state(3).unwrap().scan_start, 1);
    }
}
