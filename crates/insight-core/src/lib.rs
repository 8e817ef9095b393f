#![warn(missing_docs)]
//! Insight Core - Headless Annotation Index with Incremental Highlighting
//!
//! # Overview
//!
//! `insight-core` tracks *insights* over a mutable text buffer: spelling, grammar and typography
//! findings produced by external inspectors, and notes written by the user. Each insight is a
//! position-anchored range that follows the text as it is edited. The index keeps insights sorted
//! by position, notices when an edit collapses one to zero length and removes it safely, and
//! repaints only the paragraphs whose highlighting is actually affected by a change.
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  SceneDocument (edits, actions, notes I/O)  │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  InsightIndex + Highlighter                 │  ← Resume pointers, auto-removal
//! ├─────────────────────────────────────────────┤
//! │  Insight variants / AnchoredRange           │  ← Values, edit transform
//! ├─────────────────────────────────────────────┤
//! │  SortedVec                                  │  ← Ordered storage
//! ├─────────────────────────────────────────────┤
//! │  Document (Rope + per-paragraph formats)    │  ← Host text
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use insight_core::{Insight, InsightAction, ParagraphLayout, SceneDocument, SceneOptions, SPELLING_FORMAT_ID};
//!
//! let mut scene = SceneDocument::new("Teh quick fox", SceneOptions::default());
//! let len = scene.document().len_chars();
//! scene.add_insight(Insight::spelling(0, 3, len, "Unknown word", vec!["The".into()]).unwrap());
//! assert_eq!(scene.document().formats_at(0), vec![SPELLING_FORMAT_ID]);
//!
//! // Applying the suggestion rewrites the text; the insight collapses and is removed.
//! scene.trigger(0, InsightAction::Replace("The".into())).unwrap();
//! assert_eq!(scene.document().text(), "The quick fox");
//! assert!(scene.index().is_empty());
//! ```
//!
//! # Module Description
//!
//! - [`sorted_vec`] - Vector kept sorted at all times, with in-place relocation
//! - [`anchor`] - Anchored ranges and the pure edit transform
//! - [`insight`] - Insight variants, menus and translation
//! - [`index`] - Insight index, handles and auto-removal events
//! - [`highlight`] - Per-paragraph highlighting state
//! - [`document`] - Rope-backed host document
//! - [`inspection`] - Inspector seam for background analysis
//! - [`scene`] - Document and index wired together

pub mod anchor;
pub mod delta;
pub mod document;
pub mod format;
pub mod highlight;
pub mod index;
pub mod insight;
pub mod inspection;
pub mod scene;
pub mod sorted_vec;

pub use anchor::{
    AnchoredRange, Attachment, RangeError, RangeUpdate, transform_position, transform_range,
};
pub use delta::ContentsChange;
pub use document::{Document, EditError, FormatSink, ParagraphLayout};
pub use format::{
    FormatId, FormatSpan, GRAMMAR_FORMAT_ID, InsightFormat, NOTE_FORMAT_ID, Rgb,
    SPELLING_FORMAT_ID, TYPOGRAPHY_FORMAT_ID, UnderlineStyle,
};
pub use highlight::{HighlightStatus, ParagraphState};
pub use index::{Handle, IndexEvent, IndexEventCallback, InsightId, InsightIndex};
pub use insight::{
    Insight, InsightAction, InsightKind, Menu, MenuItem, Translator, Untranslated,
};
pub use inspection::{Finding, InspectionError, InspectionRequest, InspectionResult, Inspector};
pub use scene::{
    NoteRecord, SceneChange, SceneChangeCallback, SceneChangeType, SceneDocument, SceneError,
    SceneOptions,
};
pub use sorted_vec::{Natural, OutOfBounds, SortOrder, SortedVec};
