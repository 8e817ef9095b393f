//! Inspection seam
//!
//! Linguistic analysis is supplied by [`Inspector`] implementations. A run works on a snapshot
//! ([`InspectionRequest`]) so it can happen on any thread; only the resulting
//! [`InspectionResult`] is brought back and integrated by the thread that owns the index (see
//! [`SceneDocument::apply_inspection`](crate::SceneDocument::apply_inspection)).

use crate::insight::InsightKind;
use thiserror::Error;

/// One finding of an inspector, relative to the inspected paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Variant of the insight to create.
    pub kind: InsightKind,
    /// Paragraph-relative start (characters).
    pub left: usize,
    /// Paragraph-relative exclusive end (characters).
    pub right: usize,
    /// Message shown to the user.
    pub message: String,
    /// Replacement suggestions.
    pub suggestions: Vec<String>,
}

/// Producer of findings for a piece of text.
pub trait Inspector: Send + Sync {
    /// Inspect one paragraph.
    fn inspect(&self, text: &str, language: &str) -> Vec<Finding>;
}

/// Snapshot of the paragraphs to inspect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectionRequest {
    /// Document revision the snapshot was taken at.
    pub revision: u64,
    /// Language tag passed to inspectors.
    pub language: String,
    /// `(paragraph, text)` pairs.
    pub paragraphs: Vec<(usize, String)>,
}

impl InspectionRequest {
    /// Run every inspector over every paragraph.
    pub fn run(&self, inspectors: &[Box<dyn Inspector>]) -> InspectionResult {
        let paragraphs = self
            .paragraphs
            .iter()
            .map(|(paragraph, text)| {
                let findings = inspectors
                    .iter()
                    .flat_map(|inspector| inspector.inspect(text, &self.language))
                    .collect();
                (*paragraph, findings)
            })
            .collect();
        InspectionResult {
            revision: self.revision,
            paragraphs,
        }
    }
}

/// Findings of one inspection run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InspectionResult {
    /// Revision of the inspected snapshot.
    pub revision: u64,
    /// Findings per inspected paragraph. A paragraph without findings is still listed.
    pub paragraphs: Vec<(usize, Vec<Finding>)>,
}

impl InspectionResult {
    /// Total number of findings.
    pub fn finding_count(&self) -> usize {
        self.paragraphs.iter().map(|(_, f)| f.len()).sum()
    }
}

/// Errors integrating an inspection result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InspectionError {
    /// The document changed since the snapshot was taken.
    #[error("stale inspection result: revision {result}, document is at {document}")]
    Stale {
        /// Revision of the result.
        result: u64,
        /// Current document revision.
        document: u64,
    },
}
