//! Boundary points and ranges

use std::cmp::Ordering;

use super::{Document, NodeId};

/// A boundary point in the document.
///
/// For text nodes `offset` counts characters. For elements and the document
/// node it counts children, so `(element, 0)` is the start of its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub node: NodeId,
    pub offset: usize,
}

impl Position {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A pair of boundary points, `start` not after `end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// A collapsed range at a single point
    pub fn collapsed_at(point: Position) -> Self {
        Self {
            start: point,
            end: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// Compare two boundary points in document order
pub fn compare_points(doc: &Document, a: Position, b: Position) -> Ordering {
    if a.node == b.node {
        return a.offset.cmp(&b.offset);
    }

    // a's node contains b's node: compare a's offset with the index of the
    // child of a.node that holds b
    if doc.is_ancestor(a.node, b.node) {
        let child_index = child_index_toward(doc, a.node, b.node);
        return if a.offset <= child_index {
            Ordering::Less
        } else {
            Ordering::Greater
        };
    }

    if doc.is_ancestor(b.node, a.node) {
        let child_index = child_index_toward(doc, b.node, a.node);
        return if b.offset <= child_index {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }

    doc.tree_order(a.node, b.node)
}

/// Index of the child of `ancestor` on the path to `descendant`
fn child_index_toward(doc: &Document, ancestor: NodeId, descendant: NodeId) -> usize {
    let mut current = descendant;
    while let Some(parent) = doc.parent(current) {
        if parent == ancestor {
            return doc.index_in_parent(current).unwrap_or(0);
        }
        current = parent;
    }
    0
}
