//! Wrapper markup surgery

use tracing::trace;

use crate::dom::{Document, NodeId, OverlayKind, Position, Range, TextIndex};
use crate::normalize::normalize_range;

/// Inline style applied to new wrapper elements
pub fn wrapper_style(color: &str) -> String {
    format!("display: inline; background-color: {}", color)
}

/// Wrap every text node fully covered by `range`.
///
/// Boundary text nodes are split first so only covered text ends up inside
/// a wrapper. Returns the wrappers now holding the covered text, in document
/// order, without duplicates.
pub fn wrap_range(doc: &mut Document, range: Range, color: &str) -> Vec<NodeId> {
    let range = normalize_range(doc, range);
    let mut start = range.start;
    let mut end = range.end;

    // End first: the head keeps its identity, so `start` stays valid
    split_inside(doc, end);
    if let Some(tail) = split_inside(doc, start) {
        if end.node == start.node {
            end = Position::new(tail, end.offset - start.offset);
        }
        start = Position::new(tail, 0);
    }

    let index = TextIndex::build(doc, doc.root());
    let (Some(from), Some(to)) = (index.offset_of(doc, start), index.offset_of(doc, end)) else {
        return Vec::new();
    };
    if from >= to {
        return Vec::new();
    }

    let mut wrappers = Vec::new();
    for text in index.texts_within(from, to) {
        let Some((s, e)) = index.span(text) else {
            continue;
        };
        if s < from || e > to {
            continue;
        }
        let wrapper = wrap_text_node(doc, text, color);
        if !wrappers.contains(&wrapper) {
            wrappers.push(wrapper);
        }
    }

    trace!(from, to, count = wrappers.len(), "wrapped range");
    wrappers
}

/// Split a text node when the point falls strictly inside it
fn split_inside(doc: &mut Document, point: Position) -> Option<NodeId> {
    if !doc.is_text(point.node) {
        return None;
    }
    let len = doc.text_len(point.node);
    if point.offset == 0 || point.offset >= len {
        return None;
    }
    doc.split_text(point.node, point.offset)
}

/// Put a single text node inside a wrapper.
///
/// Already wrapped text returns its wrapper untouched. Text directly next to
/// a wrapper joins it instead of getting a wrapper of its own.
pub fn wrap_text_node(doc: &mut Document, text: NodeId, color: &str) -> NodeId {
    if let Some(parent) = doc.parent(text) {
        if doc.is_highlight_wrapper(parent) {
            return parent;
        }
    }

    if let Some(next) = doc.next_sibling(text) {
        if doc.is_highlight_wrapper(next) {
            let first = doc.first_child(next);
            doc.insert_before(next, text, first);
            return next;
        }
    }

    if let Some(prev) = doc.previous_sibling(text) {
        if doc.is_highlight_wrapper(prev) {
            doc.append_child(prev, text);
            return prev;
        }
    }

    let wrapper = doc.create_overlay(OverlayKind::Highlight);
    doc.set_attribute(wrapper, "style", &wrapper_style(color));
    if let Some(parent) = doc.parent(text) {
        doc.insert_before(parent, wrapper, Some(text));
    }
    doc.append_child(wrapper, text);
    wrapper
}

/// Move a wrapper's children out and drop it
pub fn unwrap(doc: &mut Document, wrapper: NodeId) {
    if doc.is_attached(wrapper) {
        doc.unwrap_element(wrapper);
    }
}

/// Shrink a wrapper to the text inside `[keep_from, keep_to)`.
///
/// Children entirely before the kept span move out in front of the wrapper,
/// children entirely after it move out behind. A wrapper left empty is
/// detached.
pub fn peel(doc: &mut Document, wrapper: NodeId, index: &TextIndex, keep_from: usize, keep_to: usize) {
    let Some(parent) = doc.parent(wrapper) else {
        return;
    };

    let children = doc.children(wrapper).to_vec();
    let spans: Vec<(usize, usize)> = children
        .iter()
        .enumerate()
        .map(|(i, &child)| {
            index.span(child).unwrap_or_else(|| {
                let at = index
                    .offset_of(doc, Position::new(wrapper, i))
                    .unwrap_or(keep_from);
                (at, at)
            })
        })
        .collect();

    let before: Vec<NodeId> = children
        .iter()
        .zip(&spans)
        .filter(|(_, &(s, e))| s < keep_from && e <= keep_from)
        .map(|(&child, _)| child)
        .collect();
    let after: Vec<NodeId> = children
        .iter()
        .zip(&spans)
        .filter(|(_, &(s, e))| s >= keep_to && e > keep_to)
        .map(|(&child, _)| child)
        .collect();

    for child in before {
        doc.insert_before(parent, child, Some(wrapper));
    }
    for child in after.into_iter().rev() {
        doc.insert_after(wrapper, child);
    }

    if doc.children(wrapper).is_empty() {
        doc.detach(wrapper);
    }
}
