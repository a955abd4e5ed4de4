//! Logical text runs
//!
//! Every walk that counts runs, accumulates offsets or counts path siblings
//! goes through these helpers so that encoding and decoding see the same
//! children the same way.

use crate::dom::{Document, NodeId, OverlayKind};

/// How a child participates in a logical text run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunRole {
    /// Text content: text nodes and highlight wrappers
    Text,
    /// Ignored entirely: annotation markers
    Transparent,
    /// Ends the current run: any other element
    Break,
}

pub fn run_role(doc: &Document, node: NodeId) -> RunRole {
    if doc.is_text(node) {
        return RunRole::Text;
    }
    match doc.overlay_kind(node) {
        Some(OverlayKind::Highlight) => RunRole::Text,
        Some(OverlayKind::AnnotationMarker) => RunRole::Transparent,
        None => RunRole::Break,
    }
}

/// Characters contributed to a run by `node`
pub fn run_len(doc: &Document, node: NodeId) -> usize {
    run_texts(doc, node)
        .into_iter()
        .map(|text| doc.text_len(text))
        .sum()
}

/// Text nodes that make up `node`'s share of a run, in order
pub fn run_texts(doc: &Document, node: NodeId) -> Vec<NodeId> {
    match run_role(doc, node) {
        RunRole::Text if doc.is_text(node) => vec![node],
        RunRole::Text => doc.descendant_texts(node),
        _ => Vec::new(),
    }
}

/// Whether an element takes part in structural path sibling counting
pub fn counts_toward_path(doc: &Document, node: NodeId) -> bool {
    doc.is_element(node) && doc.overlay_kind(node).is_none()
}

/// Counts runs while walking a parent's children in order
#[derive(Debug, Default)]
pub struct RunCounter {
    run: u32,
    in_run: bool,
}

impl RunCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next child's role; returns true when it opens a new run
    pub fn visit(&mut self, role: RunRole) -> bool {
        match role {
            RunRole::Text if !self.in_run => {
                self.run += 1;
                self.in_run = true;
                true
            }
            RunRole::Text | RunRole::Transparent => false,
            RunRole::Break => {
                self.in_run = false;
                false
            }
        }
    }

    /// Current 1-based run number (0 before the first run)
    pub fn run(&self) -> u32 {
        self.run
    }
}
