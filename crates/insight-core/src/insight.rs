//! Insight values.
//!
//! An [`Insight`] is one highlighted span: an anchored range plus message, category, visual
//! format and context menu. The variants form a closed set ([`InsightKind`]); behaviour that
//! differs between them is an exhaustive `match`, not dynamic dispatch.

use crate::anchor::{AnchoredRange, RangeError};
use crate::format::{
    GRAMMAR_FORMAT, InsightFormat, NOTE_FORMAT, SPELLING_FORMAT, TYPOGRAPHY_FORMAT,
};
use serde::{Deserialize, Serialize};

/// Insight variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    /// User note (persistent).
    Note,
    /// Spelling finding.
    Spelling,
    /// Grammar finding.
    Grammar,
    /// Typography finding.
    Typography,
}

impl InsightKind {
    /// Persistent insights are saved with the document; the others are regenerated by analysis.
    pub fn is_persistent(self) -> bool {
        match self {
            InsightKind::Note => true,
            InsightKind::Spelling | InsightKind::Grammar | InsightKind::Typography => false,
        }
    }

    /// Visual format.
    pub fn format(self) -> InsightFormat {
        match self {
            InsightKind::Note => NOTE_FORMAT,
            InsightKind::Spelling => SPELLING_FORMAT,
            InsightKind::Grammar => GRAMMAR_FORMAT,
            InsightKind::Typography => TYPOGRAPHY_FORMAT,
        }
    }

    /// Untranslated category name.
    pub fn category_key(self) -> &'static str {
        match self {
            InsightKind::Note => "Note",
            InsightKind::Spelling => "Spelling",
            InsightKind::Grammar => "Grammar",
            InsightKind::Typography => "Typography",
        }
    }
}

/// Source of user-visible strings.
///
/// Passed explicitly wherever labels are (re)built.
pub trait Translator {
    /// Translate an untranslated source string.
    fn translate(&self, text: &str) -> String;
}

/// Identity translation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Untranslated;

impl Translator for Untranslated {
    fn translate(&self, text: &str) -> String {
        text.to_owned()
    }
}

/// Action behind a context menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InsightAction {
    /// Replace the message of a note. Menu entries carry the current message as initial text.
    Edit(String),
    /// Remove the insight.
    Remove,
    /// Replace the insight's text by a suggestion.
    Replace(String),
}

/// One context menu entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    /// Display label.
    pub label: String,
    /// Triggered action.
    pub action: InsightAction,
}

/// Context menu of an insight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Menu {
    /// Menu title.
    pub title: String,
    /// Entries in display order.
    pub items: Vec<MenuItem>,
}

/// A highlighted, position-anchored annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insight {
    kind: InsightKind,
    range: AnchoredRange,
    message: String,
    category: String,
    suggestions: Vec<String>,
    menu: Menu,
}

impl Insight {
    /// Create an insight over `[left, right)` of a document of `len` characters.
    ///
    /// Suggestions are ignored for notes.
    pub fn new(
        kind: InsightKind,
        left: usize,
        right: usize,
        len: usize,
        message: impl Into<String>,
        suggestions: Vec<String>,
    ) -> Result<Self, RangeError> {
        let range = AnchoredRange::new(left, right, len)?;
        let suggestions = if kind.is_persistent() {
            Vec::new()
        } else {
            suggestions
        };
        let mut insight = Self {
            kind,
            range,
            message: message.into(),
            category: String::new(),
            suggestions,
            menu: Menu::default(),
        };
        insight.retranslate(&Untranslated);
        Ok(insight)
    }

    /// Create a note.
    pub fn note(
        left: usize,
        right: usize,
        len: usize,
        message: impl Into<String>,
    ) -> Result<Self, RangeError> {
        Self::new(InsightKind::Note, left, right, len, message, Vec::new())
    }

    /// Create a spelling finding.
    pub fn spelling(
        left: usize,
        right: usize,
        len: usize,
        message: impl Into<String>,
        suggestions: Vec<String>,
    ) -> Result<Self, RangeError> {
        Self::new(InsightKind::Spelling, left, right, len, message, suggestions)
    }

    /// Create a grammar finding.
    pub fn grammar(
        left: usize,
        right: usize,
        len: usize,
        message: impl Into<String>,
        suggestions: Vec<String>,
    ) -> Result<Self, RangeError> {
        Self::new(InsightKind::Grammar, left, right, len, message, suggestions)
    }

    /// Create a typography finding.
    pub fn typography(
        left: usize,
        right: usize,
        len: usize,
        message: impl Into<String>,
        suggestions: Vec<String>,
    ) -> Result<Self, RangeError> {
        Self::new(InsightKind::Typography, left, right, len, message, suggestions)
    }

    /// Variant.
    pub fn kind(&self) -> InsightKind {
        self.kind
    }

    /// `(left, right)`.
    pub fn range(&self) -> (usize, usize) {
        self.range.range()
    }

    /// Anchored range.
    pub fn anchor(&self) -> &AnchoredRange {
        &self.range
    }

    pub(crate) fn anchor_mut(&mut self) -> &mut AnchoredRange {
        &mut self.range
    }

    /// Move the insight to `[left, right)` of a document of `len` characters.
    ///
    /// Inside an index this must go through [`InsightIndex::modify`](crate::InsightIndex::modify)
    /// so the entry is re-sorted. Setting an empty range removes the insight on the next drain.
    pub fn set_range(&mut self, left: usize, right: usize, len: usize) -> Result<(), RangeError> {
        self.range.set_range(left, right, len)
    }

    /// Message (tooltip text).
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Change the message.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
        if self.kind == InsightKind::Note {
            self.rebuild_note_edit();
        }
    }

    /// Translated category.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Replacement suggestions (empty for notes).
    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    /// Visual format.
    pub fn format(&self) -> InsightFormat {
        self.kind.format()
    }

    /// See [`InsightKind::is_persistent`].
    pub fn is_persistent(&self) -> bool {
        self.kind.is_persistent()
    }

    /// Context menu.
    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    /// Rebuild category and menu labels with `translator`.
    pub fn retranslate(&mut self, translator: &dyn Translator) {
        self.category = translator.translate(self.kind.category_key());
        self.menu = match self.kind {
            InsightKind::Note => Menu {
                title: translator.translate("Note"),
                items: vec![
                    MenuItem {
                        label: translator.translate("Edit"),
                        action: InsightAction::Edit(self.message.clone()),
                    },
                    MenuItem {
                        label: translator.translate("Remove"),
                        action: InsightAction::Remove,
                    },
                ],
            },
            InsightKind::Spelling | InsightKind::Grammar | InsightKind::Typography => Menu {
                title: self.category.clone(),
                items: self
                    .suggestions
                    .iter()
                    .map(|s| MenuItem {
                        label: s.clone(),
                        action: InsightAction::Replace(s.clone()),
                    })
                    .collect(),
            },
        };
    }

    fn rebuild_note_edit(&mut self) {
        for item in &mut self.menu.items {
            if let InsightAction::Edit(text) = &mut item.action {
                text.clone_from(&self.message);
            }
        }
    }
}
