//! Insight index
//!
//! [`InsightIndex`] owns every [`Insight`] of a document in a [`SortedVec`] ordered by
//! `(left, right)`, keeps their ranges in step with document edits and drives the
//! [`highlight`](crate::highlight) pass over the host document.
//!
//! Ranges that collapse to zero length are never removed while the container is being scanned.
//! They are queued and removed afterwards by [`InsightIndex::process_pending_removals`], which
//! brackets every removal with [`IndexEvent::AboutToAutoRemove`] and [`IndexEvent::AutoRemoved`].
//!
//! Handles ([`Handle`]) are positions into the sequence. Any structural change (insert, erase or
//! reorder) invalidates all outstanding handles; using one afterwards is a programming error and
//! panics.

use crate::anchor::AnchoredRange;
use crate::delta::ContentsChange;
use crate::document::{FormatSink, ParagraphLayout};
use crate::format::FormatId;
use crate::highlight::{Highlighted, Highlighter, ParagraphState};
use crate::insight::{Insight, Translator};
use crate::sorted_vec::{SortOrder, SortedVec};
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use tracing::debug;

static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

/// Stable identity of an indexed insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InsightId(u64);

impl InsightId {
    /// Raw value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InsightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Position of an entry, valid until the next structural change of the index that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: usize,
    generation: u64,
    owner: u64,
}

impl Handle {
    /// Index into the sorted sequence.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Notification around an automatic removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexEvent {
    /// The collapsed insight at `index` is about to be removed.
    AboutToAutoRemove {
        /// Current index of the insight.
        index: usize,
        /// Identity of the insight.
        id: InsightId,
    },
    /// The insight formerly at `index` was removed; indices at or after it shifted down.
    AutoRemoved {
        /// Index the insight had.
        index: usize,
        /// Identity of the removed insight.
        id: InsightId,
    },
}

/// Index event callback.
pub type IndexEventCallback = Box<dyn FnMut(&IndexEvent) + Send>;

#[derive(Debug, Clone)]
struct Entry {
    id: InsightId,
    insight: Insight,
}

impl Highlighted for Entry {
    fn anchor(&self) -> &AnchoredRange {
        self.insight.anchor()
    }

    fn format_id(&self) -> FormatId {
        self.insight.format().id
    }
}

struct ByRange;

impl SortOrder<Entry> for ByRange {
    fn compare(a: &Entry, b: &Entry) -> Ordering {
        a.insight.range().cmp(&b.insight.range())
    }
}

/// Ordered collection of insights with incremental highlighting.
pub struct InsightIndex {
    owner: u64,
    generation: u64,
    next_id: u64,
    entries: SortedVec<Entry, ByRange>,
    highlighter: Highlighter,
    pending: VecDeque<InsightId>,
    subscribers: Vec<IndexEventCallback>,
}

impl InsightIndex {
    /// Create an empty index for a document laid out as `layout`.
    pub fn new(layout: &dyn ParagraphLayout) -> Self {
        Self {
            owner: NEXT_OWNER.fetch_add(1, AtomicOrdering::Relaxed),
            generation: 0,
            next_id: 1,
            entries: SortedVec::new(),
            highlighter: Highlighter::new(layout.paragraph_count()),
            pending: VecDeque::new(),
            subscribers: Vec::new(),
        }
    }

    /// Number of insights.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in `(left, right)` order.
    pub fn iter(&self) -> impl Iterator<Item = &Insight> {
        self.entries.iter().map(|e| &e.insight)
    }

    /// Iterate with identities, in order.
    pub fn iter_with_ids(&self) -> impl Iterator<Item = (InsightId, &Insight)> {
        self.entries.iter().map(|e| (e.id, &e.insight))
    }

    /// Insight at `index`.
    pub fn get(&self, index: usize) -> Option<&Insight> {
        self.entries.get(index).map(|e| &e.insight)
    }

    /// Identity of the insight at `index`.
    pub fn id_at(&self, index: usize) -> Option<InsightId> {
        self.entries.get(index).map(|e| e.id)
    }

    /// Handle to `index`, if it exists.
    pub fn handle(&self, index: usize) -> Option<Handle> {
        (index < self.entries.len()).then(|| self.make_handle(index))
    }

    /// Handle to the first insight.
    pub fn begin(&self) -> Option<Handle> {
        self.handle(0)
    }

    /// Insight referred to by `handle`.
    ///
    /// # Panics
    ///
    /// If the handle was issued by another index or before the last structural change.
    pub fn resolve(&self, handle: Handle) -> &Insight {
        self.check(handle);
        &self.entries[handle.index].insight
    }

    /// Current index of the insight with identity `id` (linear scan).
    pub fn position_of(&self, id: InsightId) -> Option<usize> {
        self.entries.position(|e| e.id == id)
    }

    /// First insight whose range equals `range`.
    pub fn find(&self, range: (usize, usize)) -> Option<Handle> {
        let slice = self.entries.as_slice();
        let pos = slice.partition_point(|e| e.insight.range() < range);
        match slice.get(pos) {
            Some(e) if e.insight.range() == range => Some(self.make_handle(pos)),
            _ => None,
        }
    }

    /// Insights whose range contains `offset`, in order.
    pub fn insights_at(&self, offset: usize) -> impl Iterator<Item = (usize, &Insight)> {
        self.entries
            .iter()
            .enumerate()
            .take_while(move |(_, e)| e.insight.range().0 <= offset)
            .filter(move |(_, e)| e.insight.anchor().contains(offset))
            .map(|(i, e)| (i, &e.insight))
    }

    /// Highlighting state of a paragraph.
    pub fn paragraph_state(&self, paragraph: usize) -> Option<&ParagraphState> {
        self.highlighter.state(paragraph)
    }

    /// Identities queued for automatic removal.
    pub fn pending_removals(&self) -> impl Iterator<Item = InsightId> + '_ {
        self.pending.iter().copied()
    }

    /// Register a callback for [`IndexEvent`]s.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&IndexEvent) + Send + 'static,
    {
        self.subscribers.push(Box::new(callback));
    }

    /// Insert an insight and highlight the paragraphs it spans.
    pub fn insert<D>(&mut self, doc: &mut D, insight: Insight) -> Handle
    where
        D: ParagraphLayout + FormatSink,
    {
        self.insert_impl(doc, insight, None)
    }

    /// Insert starting the position search at `hint`. The resulting position does not depend on
    /// the hint.
    pub fn insert_with_hint<D>(&mut self, doc: &mut D, insight: Insight, hint: usize) -> Handle
    where
        D: ParagraphLayout + FormatSink,
    {
        self.insert_impl(doc, insight, Some(hint))
    }

    fn insert_impl<D>(&mut self, doc: &mut D, insight: Insight, hint: Option<usize>) -> Handle
    where
        D: ParagraphLayout + FormatSink,
    {
        let id = InsightId(self.next_id);
        self.next_id += 1;
        let (first, last) = insight.anchor().paragraphs(&*doc);
        let entry = Entry { id, insight };
        let index = match hint {
            Some(hint) => self.entries.insert_with_hint(entry, hint),
            None => self.entries.insert(entry),
        };
        self.generation += 1;
        self.highlighter.entry_inserted(index, first, last);
        self.rehighlight(doc);
        self.make_handle(index)
    }

    /// Remove the insight at `handle` and repaint the paragraphs it covered.
    ///
    /// Returns a handle to the insight that followed it, if any.
    ///
    /// # Panics
    ///
    /// If the handle was issued by another index or before the last structural change.
    pub fn erase<D>(&mut self, doc: &mut D, handle: Handle) -> Option<Handle>
    where
        D: ParagraphLayout + FormatSink,
    {
        self.check(handle);
        self.erase_at(doc, handle.index);
        self.rehighlight(doc);
        self.handle(handle.index)
    }

    /// Mutate an insight in place, re-sort it and repaint what it covered before and after.
    ///
    /// Returns the insight's new handle.
    ///
    /// # Panics
    ///
    /// If the handle was issued by another index or before the last structural change.
    pub fn modify<D, F>(&mut self, doc: &mut D, handle: Handle, mutate: F) -> Handle
    where
        D: ParagraphLayout + FormatSink,
        F: FnOnce(&mut Insight),
    {
        self.check(handle);
        let old_index = handle.index;
        let (old_first, old_last) = self.entries[old_index].insight.anchor().paragraphs(&*doc);

        let mut new_span = (old_first, old_last);
        let mut collapsed = None;
        let new_index = self
            .entries
            .modify(old_index, |entry| {
                mutate(&mut entry.insight);
                new_span = entry.insight.anchor().paragraphs(&*doc);
                if entry.insight.anchor().is_collapsed() {
                    collapsed = Some(entry.id);
                }
            })
            .unwrap_or(old_index);

        self.generation += 1;
        self.highlighter.entry_erased(old_index, old_first, old_last);
        self.highlighter
            .entry_inserted(new_index, new_span.0, new_span.1);
        if let Some(id) = collapsed {
            self.enqueue_removal(id);
        }
        self.rehighlight(doc);
        self.make_handle(new_index)
    }

    /// Remove every ephemeral insight overlapping `[start, end)`.
    ///
    /// Returns `true` if anything was removed.
    pub fn remove_ephemeral_in<D>(&mut self, doc: &mut D, start: usize, end: usize) -> bool
    where
        D: ParagraphLayout + FormatSink,
    {
        let mut removed = false;
        let mut i = 0;
        while i < self.entries.len() {
            let insight = &self.entries[i].insight;
            let (left, right) = insight.range();
            if left >= end {
                break;
            }
            if !insight.is_persistent() && left < end && right > start {
                self.erase_at(doc, i);
                removed = true;
            } else {
                i += 1;
            }
        }
        if removed {
            self.rehighlight(doc);
        }
        removed
    }

    /// Remove every insight.
    pub fn clear<D>(&mut self, doc: &mut D)
    where
        D: ParagraphLayout + FormatSink,
    {
        for index in (0..self.entries.len()).rev() {
            self.erase_at(doc, index);
        }
        self.pending.clear();
        self.rehighlight(doc);
    }

    /// Rebuild category and menu labels of every insight.
    pub fn retranslate(&mut self, translator: &dyn Translator) {
        self.entries
            .modify_all(|entry| entry.insight.retranslate(translator));
    }

    /// Fold a document edit into every insight range.
    ///
    /// Must be called once per edit, after the host applied it and before the next
    /// highlighting pass. Repaints affected paragraphs and drains pending removals.
    pub fn on_contents_change<D>(&mut self, doc: &mut D, change: &ContentsChange)
    where
        D: ParagraphLayout + FormatSink,
    {
        if change.is_empty() {
            return;
        }
        self.highlighter
            .contents_changed(change, doc.paragraph_count());

        let mut touched = Vec::new();
        let mut collapsed = Vec::new();
        let mut index = 0;
        let reordered = self.entries.modify_all(|entry| {
            let old = entry.insight.range();
            let update = entry.insight.anchor_mut().apply_change(change);
            if update.touched {
                touched.push((index, old));
            }
            if update.collapsed {
                collapsed.push(entry.id);
            }
            index += 1;
        });

        if reordered {
            debug!(
                position = change.position,
                "edit reordered insights; resetting resume pointers"
            );
            self.generation += 1;
            self.highlighter.reset();
        } else {
            for (index, (old_left, old_right)) in touched {
                let (first, last) = self.entries[index].insight.anchor().paragraphs(&*doc);
                let old_first = map_paragraph(change, old_left, &*doc);
                let old_last =
                    map_paragraph(change, old_right.saturating_sub(1).max(old_left), &*doc);
                self.highlighter
                    .entry_extended(index, first.min(old_first), last.max(old_last));
            }
        }

        for id in collapsed {
            self.enqueue_removal(id);
        }
        self.process_pending_removals(doc);
    }

    /// Schedule a paragraph for rehighlighting.
    pub fn invalidate(&mut self, paragraph: usize) {
        self.highlighter.invalidate(paragraph..=paragraph);
    }

    /// Schedule every paragraph for rehighlighting.
    pub fn invalidate_all(&mut self) {
        self.highlighter.invalidate_all();
    }

    /// Highlight all scheduled paragraphs. Collapsed insights found on the way are queued.
    pub fn rehighlight<D>(&mut self, doc: &mut D)
    where
        D: ParagraphLayout + FormatSink,
    {
        if self.highlighter.is_clean() {
            return;
        }
        let collapsed = self.highlighter.run(self.entries.as_slice(), doc);
        for index in collapsed {
            let id = self.entries[index].id;
            self.enqueue_removal(id);
        }
    }

    /// Remove queued collapsed insights, notifying subscribers around each removal.
    ///
    /// Entries that are gone or no longer collapsed are skipped. Returns the number removed.
    pub fn process_pending_removals<D>(&mut self, doc: &mut D) -> usize
    where
        D: ParagraphLayout + FormatSink,
    {
        let mut removed = 0;
        loop {
            self.rehighlight(doc);
            let Some(id) = self.pending.pop_front() else {
                break;
            };
            let Some(index) = self.position_of(id) else {
                continue;
            };
            if !self.entries[index].insight.anchor().is_collapsed() {
                continue;
            }
            debug!(%id, index, "auto-removing collapsed insight");
            self.emit(&IndexEvent::AboutToAutoRemove { index, id });
            self.erase_at(doc, index);
            self.emit(&IndexEvent::AutoRemoved { index, id });
            removed += 1;
        }
        removed
    }

    fn enqueue_removal(&mut self, id: InsightId) {
        if !self.pending.contains(&id) {
            self.pending.push_back(id);
        }
    }

    fn erase_at<D>(&mut self, doc: &mut D, index: usize)
    where
        D: ParagraphLayout + FormatSink,
    {
        let Ok(entry) = self.entries.remove(index) else {
            return;
        };
        let (first, last) = entry.insight.anchor().paragraphs(&*doc);
        self.generation += 1;
        self.highlighter.entry_erased(index, first, last);
    }

    fn emit(&mut self, event: &IndexEvent) {
        for callback in &mut self.subscribers {
            callback(event);
        }
    }

    fn make_handle(&self, index: usize) -> Handle {
        Handle {
            index,
            generation: self.generation,
            owner: self.owner,
        }
    }

    fn check(&self, handle: Handle) {
        assert!(
            handle.owner == self.owner,
            "handle was issued by another insight index"
        );
        assert!(
            handle.generation == self.generation && handle.index < self.entries.len(),
            "stale insight handle (index {}, generation {} != {})",
            handle.index,
            handle.generation,
            self.generation
        );
    }
}

impl fmt::Debug for InsightIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InsightIndex")
            .field("entries", &self.entries)
            .field("generation", &self.generation)
            .field("pending", &self.pending)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

/// New paragraph of a position `offset` of the old text, for positions outside the edit.
fn map_paragraph(change: &ContentsChange, offset: usize, layout: &dyn ParagraphLayout) -> usize {
    if offset < change.position {
        return layout.paragraph_at(offset);
    }
    if offset < change.removed_end() {
        return change.first_paragraph;
    }
    layout.paragraph_at(offset - change.removed + change.added)
}
