//! Scene document
//!
//! [`SceneDocument`] ties a [`Document`] to its [`InsightIndex`]: every text edit is fed to the
//! index before the next highlighting pass, collapsed insights are drained afterwards, and every
//! state change bumps a version number and notifies subscribers.
//!
//! # Example
//!
//! ```
//! use insight_core::{SceneDocument, SceneOptions};
//!
//! let mut scene = SceneDocument::new("Hello world", SceneOptions::default());
//! scene.add_note(6, 11, "check the name").unwrap();
//! scene.remove_text(6, 5).unwrap();
//! assert!(scene.index().is_empty());
//! ```

use crate::anchor::RangeError;
use crate::delta::ContentsChange;
use crate::document::{Document, EditError, ParagraphLayout};
use crate::index::{Handle, IndexEvent, InsightIndex};
use crate::insight::{Insight, InsightAction, InsightKind, Translator};
use crate::inspection::{InspectionError, InspectionRequest, InspectionResult};
use crate::sorted_vec::OutOfBounds;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use thiserror::Error;
use tracing::{debug, warn};

/// Scene configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneOptions {
    /// Language tag handed to inspectors.
    pub language: String,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            language: "en_US".to_string(),
        }
    }
}

/// Persisted form of a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    /// Start character offset.
    pub left: usize,
    /// Exclusive end character offset.
    pub right: usize,
    /// Note text.
    pub message: String,
}

/// Scene operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    /// Invalid insight range.
    #[error(transparent)]
    Range(#[from] RangeError),
    /// Invalid text edit.
    #[error(transparent)]
    Edit(#[from] EditError),
    /// Insight index out of range.
    #[error(transparent)]
    OutOfBounds(#[from] OutOfBounds),
    /// Inspection result could not be applied.
    #[error(transparent)]
    Inspection(#[from] InspectionError),
    /// The insight does not offer this action.
    #[error("{kind:?} insights do not support {action:?}")]
    UnsupportedAction {
        /// Insight variant.
        kind: InsightKind,
        /// Rejected action.
        action: InsightAction,
    },
}

/// Kind of scene state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneChangeType {
    /// The text was edited.
    TextEdited,
    /// Insights were added, removed or moved.
    InsightsChanged,
    /// A note message changed.
    MessageChanged,
    /// Labels were retranslated.
    Retranslated,
}

/// Scene state change record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneChange {
    /// Change type.
    pub change_type: SceneChangeType,
    /// Old version number.
    pub old_version: u64,
    /// New version number.
    pub new_version: u64,
    /// Text edit, for [`SceneChangeType::TextEdited`].
    pub text_change: Option<ContentsChange>,
}

/// Scene change callback function type.
pub type SceneChangeCallback = Box<dyn FnMut(&SceneChange) + Send>;

/// A document with its insights.
pub struct SceneDocument {
    document: Document,
    index: InsightIndex,
    options: SceneOptions,
    version: u64,
    callbacks: Vec<SceneChangeCallback>,
}

impl SceneDocument {
    /// Create a scene over `text`.
    pub fn new(text: &str, options: SceneOptions) -> Self {
        let document = Document::new(text);
        let index = InsightIndex::new(&document);
        Self {
            document,
            index,
            options,
            version: 0,
            callbacks: Vec::new(),
        }
    }

    /// Underlying document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Insight index.
    pub fn index(&self) -> &InsightIndex {
        &self.index
    }

    /// Options.
    pub fn options(&self) -> &SceneOptions {
        &self.options
    }

    /// Current state version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Subscribe to state changes.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&SceneChange) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Subscribe to auto-removal events of the index.
    pub fn subscribe_index<F>(&mut self, callback: F)
    where
        F: FnMut(&IndexEvent) + Send + 'static,
    {
        self.index.subscribe(callback);
    }

    /// Insert text at `offset`.
    pub fn insert_text(&mut self, offset: usize, text: &str) -> Result<ContentsChange, EditError> {
        self.replace_text(offset, 0, text)
    }

    /// Remove `len` characters at `offset`.
    pub fn remove_text(&mut self, offset: usize, len: usize) -> Result<ContentsChange, EditError> {
        self.replace_text(offset, len, "")
    }

    /// Replace `len` characters at `offset` by `text`.
    pub fn replace_text(
        &mut self,
        offset: usize,
        len: usize,
        text: &str,
    ) -> Result<ContentsChange, EditError> {
        let change = self.document.replace(offset, len, text)?;
        if change.is_empty() {
            return Ok(change);
        }
        self.index.on_contents_change(&mut self.document, &change);
        self.mark_modified(SceneChangeType::TextEdited, Some(change));
        Ok(change)
    }

    /// Add a note over `[left, right)`.
    pub fn add_note(
        &mut self,
        left: usize,
        right: usize,
        message: impl Into<String>,
    ) -> Result<Handle, RangeError> {
        let note = Insight::note(left, right, self.document.len_chars(), message)?;
        Ok(self.add_insight(note))
    }

    /// Add an insight.
    pub fn add_insight(&mut self, insight: Insight) -> Handle {
        let handle = self.index.insert(&mut self.document, insight);
        self.mark_modified(SceneChangeType::InsightsChanged, None);
        handle
    }

    /// Remove an insight.
    ///
    /// # Panics
    ///
    /// If the handle is foreign or stale.
    pub fn erase(&mut self, handle: Handle) -> Option<Handle> {
        let next = self.index.erase(&mut self.document, handle);
        self.mark_modified(SceneChangeType::InsightsChanged, None);
        next
    }

    /// Run a context menu action on the insight at `index`.
    pub fn trigger(&mut self, index: usize, action: InsightAction) -> Result<(), SceneError> {
        let handle = self.index.handle(index).ok_or(OutOfBounds {
            index,
            len: self.index.len(),
        })?;
        let insight = self.index.resolve(handle);
        let kind = insight.kind();
        let (left, right) = insight.range();

        match action {
            InsightAction::Edit(message) if kind == InsightKind::Note => {
                self.index
                    .modify(&mut self.document, handle, |note| note.set_message(message));
                self.mark_modified(SceneChangeType::MessageChanged, None);
            }
            InsightAction::Remove if kind == InsightKind::Note => {
                let len = self.document.len_chars();
                // Collapsing hands the note to the regular auto-removal path.
                let mut collapsed = Ok(());
                self.index.modify(&mut self.document, handle, |note| {
                    collapsed = note.set_range(left, left, len);
                });
                collapsed?;
                self.index.process_pending_removals(&mut self.document);
                self.mark_modified(SceneChangeType::InsightsChanged, None);
            }
            InsightAction::Replace(text) if kind != InsightKind::Note => {
                self.replace_text(left, right - left, &text)?;
            }
            action => return Err(SceneError::UnsupportedAction { kind, action }),
        }
        Ok(())
    }

    /// Notes in document order, for saving.
    pub fn notes(&self) -> Vec<NoteRecord> {
        self.index
            .iter()
            .filter(|insight| insight.is_persistent())
            .map(|insight| {
                let (left, right) = insight.range();
                NoteRecord {
                    left,
                    right,
                    message: insight.message().to_string(),
                }
            })
            .collect()
    }

    /// Add saved notes. Either every record is valid and added, or none is.
    pub fn load_notes(&mut self, records: &[NoteRecord]) -> Result<usize, RangeError> {
        let len = self.document.len_chars();
        let notes = records
            .iter()
            .map(|r| Insight::note(r.left, r.right, len, r.message.clone()))
            .collect::<Result<Vec<_>, _>>()?;

        let count = notes.len();
        let mut hint = 0;
        for note in notes {
            hint = self
                .index
                .insert_with_hint(&mut self.document, note, hint)
                .index()
                + 1;
        }
        self.index.process_pending_removals(&mut self.document);
        debug!(count, "loaded notes");
        if count > 0 {
            self.mark_modified(SceneChangeType::InsightsChanged, None);
        }
        Ok(count)
    }

    /// Rebuild every insight's labels with `translator`.
    pub fn retranslate(&mut self, translator: &dyn Translator) {
        self.index.retranslate(translator);
        self.mark_modified(SceneChangeType::Retranslated, None);
    }

    /// Snapshot every paragraph for inspection.
    pub fn inspection_request(&self) -> InspectionRequest {
        self.inspection_request_for(0..self.document.paragraph_count())
    }

    /// Snapshot a range of paragraphs for inspection.
    pub fn inspection_request_for(&self, paragraphs: Range<usize>) -> InspectionRequest {
        let end = paragraphs.end.min(self.document.paragraph_count());
        InspectionRequest {
            revision: self.document.revision(),
            language: self.options.language.clone(),
            paragraphs: (paragraphs.start..end)
                .filter_map(|p| self.document.paragraph_text(p).map(|text| (p, text)))
                .collect(),
        }
    }

    /// Replace the ephemeral insights of every inspected paragraph by fresh findings.
    ///
    /// Returns the number of insights added.
    pub fn apply_inspection(&mut self, result: InspectionResult) -> Result<usize, InspectionError> {
        let revision = self.document.revision();
        if result.revision != revision {
            warn!(
                result = result.revision,
                document = revision,
                "dropping stale inspection result"
            );
            return Err(InspectionError::Stale {
                result: result.revision,
                document: revision,
            });
        }

        let mut added = 0;
        for (paragraph, findings) in result.paragraphs {
            if paragraph >= self.document.paragraph_count() {
                continue;
            }
            let start = self.document.paragraph_start(paragraph);
            let par_len = self.document.paragraph_len(paragraph);
            self.index
                .remove_ephemeral_in(&mut self.document, start, start + par_len);

            let mut hint = 0;
            for finding in findings {
                if finding.kind.is_persistent() || finding.right > par_len {
                    warn!(
                        paragraph,
                        left = finding.left,
                        right = finding.right,
                        kind = ?finding.kind,
                        "skipping invalid finding"
                    );
                    continue;
                }
                let insight = match Insight::new(
                    finding.kind,
                    start + finding.left,
                    start + finding.right,
                    self.document.len_chars(),
                    finding.message,
                    finding.suggestions,
                ) {
                    Ok(insight) => insight,
                    Err(err) => {
                        warn!(paragraph, %err, "skipping invalid finding");
                        continue;
                    }
                };
                hint = self
                    .index
                    .insert_with_hint(&mut self.document, insight, hint)
                    .index()
                    + 1;
                added += 1;
            }
        }
        self.index.process_pending_removals(&mut self.document);
        self.mark_modified(SceneChangeType::InsightsChanged, None);
        Ok(added)
    }

    fn mark_modified(&mut self, change_type: SceneChangeType, text_change: Option<ContentsChange>) {
        let old_version = self.version;
        self.version += 1;
        let change = SceneChange {
            change_type,
            old_version,
            new_version: self.version,
            text_change,
        };
        for callback in &mut self.callbacks {
            callback(&change);
        }
    }
}

impl std::fmt::Debug for SceneDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneDocument")
            .field("document", &self.document)
            .field("index", &self.index)
            .field("options", &self.options)
            .field("version", &self.version)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{NOTE_FORMAT_ID, SPELLING_FORMAT_ID};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_version_counts_changes() {
        let mut scene = SceneDocument::new("abc def", SceneOptions::default());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        scene.subscribe(move |change| sink.lock().unwrap().push(change.change_type));

        scene.add_note(0, 3, "n").unwrap();
        scene.insert_text(7, "!").unwrap();
        scene.insert_text(2, "").unwrap();
        assert_eq!(scene.version(), 2);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![SceneChangeType::InsightsChanged, SceneChangeType::TextEdited]
        );
    }

    #[test]
    fn test_edit_note_message() {
        let mut scene = SceneDocument::new("abc def", SceneOptions::default());
        scene.add_note(0, 3, "old").unwrap();
        scene
            .trigger(0, InsightAction::Edit("new".to_string()))
            .unwrap();
        assert_eq!(scene.index().get(0).unwrap().message(), "new");
    }

    #[test]
    fn test_remove_note_goes_through_auto_removal() {
        let mut scene = SceneDocument::new("abc def", SceneOptions::default());
        let events = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&events);
        scene.subscribe_index(move |_| *sink.lock().unwrap() += 1);

        scene.add_note(4, 7, "n").unwrap();
        scene.trigger(0, InsightAction::Remove).unwrap();
        assert!(scene.index().is_empty());
        assert_eq!(*events.lock().unwrap(), 2);
        assert!(scene.document().formats_at(5).is_empty());
    }

    #[test]
    fn test_replace_applies_suggestion_and_drops_insight() {
        let mut scene = SceneDocument::new("teh cat", SceneOptions::default());
        let len = scene.document().len_chars();
        scene.add_insight(
            Insight::spelling(0, 3, len, "Unknown word", vec!["the".to_string()]).unwrap(),
        );
        assert_eq!(scene.document().formats_at(1), vec![SPELLING_FORMAT_ID]);

        let action = scene.index().get(0).unwrap().menu().items[0].action.clone();
        scene.trigger(0, action).unwrap();
        assert_eq!(scene.document().text(), "the cat");
        assert!(scene.index().is_empty());
        assert!(scene.document().formats_at(1).is_empty());
    }

    #[test]
    fn test_unsupported_actions() {
        let mut scene = SceneDocument::new("abc def", SceneOptions::default());
        scene.add_note(0, 3, "n").unwrap();
        assert!(matches!(
            scene.trigger(0, InsightAction::Replace("x".into())),
            Err(SceneError::UnsupportedAction { .. })
        ));
        assert!(matches!(
            scene.trigger(5, InsightAction::Remove),
            Err(SceneError::OutOfBounds(OutOfBounds { index: 5, len: 1 }))
        ));
    }

    #[test]
    fn test_notes_round_trip() {
        let mut scene = SceneDocument::new("first\nsecond", SceneOptions::default());
        scene.add_note(6, 12, "b").unwrap();
        scene.add_note(0, 5, "a").unwrap();
        let records = scene.notes();
        assert_eq!(records[0].message, "a");

        let mut restored = SceneDocument::new("first\nsecond", SceneOptions::default());
        assert_eq!(restored.load_notes(&records).unwrap(), 2);
        assert_eq!(restored.notes(), records);
        assert_eq!(restored.document().formats_at(7), vec![NOTE_FORMAT_ID]);
    }

    #[test]
    fn test_load_notes_is_all_or_nothing() {
        let mut scene = SceneDocument::new("short", SceneOptions::default());
        let records = vec![
            NoteRecord {
                left: 0,
                right: 2,
                message: "ok".into(),
            },
            NoteRecord {
                left: 1,
                right: 40,
                message: "too long".into(),
            },
        ];
        assert!(scene.load_notes(&records).is_err());
        assert!(scene.index().is_empty());
    }
}
