//! Live position <-> Anchor conversion

use tracing::trace;

use super::path::{evaluate, path_of};
use super::runs::{run_len, run_role, run_texts, RunCounter, RunRole};
use super::types::Anchor;
use crate::dom::{Document, NodeId, Position};
use crate::error::AnchorError;
use crate::normalize::normalize_point;

/// What an encodable position resolves to after overlay adjustments
enum Target {
    /// A text node or wrapper under `parent`, `offset` chars into it
    Member {
        parent: NodeId,
        member: NodeId,
        offset: usize,
    },
    /// The structural node itself
    Structural(NodeId),
}

/// Encode a live position as an anchor. Never mutates the tree.
pub fn encode(doc: &Document, position: Position) -> Anchor {
    let position = retarget_marker(doc, normalize_point(doc, position));

    let anchor = match classify(doc, position) {
        Target::Structural(node) => Anchor::structural(path_of(doc, node)),
        Target::Member {
            parent,
            member,
            offset,
        } => {
            let mut counter = RunCounter::new();
            let mut accumulated = 0;
            for &child in doc.children(parent) {
                let role = run_role(doc, child);
                if counter.visit(role) {
                    accumulated = 0;
                }
                if child == member {
                    break;
                }
                if role == RunRole::Text {
                    accumulated += run_len(doc, child);
                }
            }
            Anchor::in_text(
                path_of(doc, parent),
                counter.run(),
                (accumulated + offset) as u32,
            )
        }
    };

    trace!(?position, %anchor, "encoded position");
    anchor
}

/// Move a position that sits on an annotation marker onto real content.
///
/// Prefers the end of the preceding text, then the start of the following
/// content, then the marker's parent.
fn retarget_marker(doc: &Document, position: Position) -> Position {
    if !doc.is_annotation_marker(position.node) {
        return position;
    }

    let previous = doc
        .preceding_siblings(position.node)
        .find(|&sib| run_role(doc, sib) != RunRole::Transparent);
    if let Some(prev) = previous {
        if run_role(doc, prev) == RunRole::Text {
            if doc.is_text(prev) {
                return Position::new(prev, doc.text_len(prev));
            }
            let end = doc.children(prev).len();
            return normalize_point(doc, Position::new(prev, end));
        }
    }

    let mut next = doc.next_sibling(position.node);
    while let Some(node) = next {
        if run_role(doc, node) != RunRole::Transparent {
            return Position::new(node, 0);
        }
        next = doc.next_sibling(node);
    }

    match doc.parent(position.node) {
        Some(parent) => Position::new(parent, 0),
        None => Position::new(doc.root(), 0),
    }
}

fn classify(doc: &Document, position: Position) -> Target {
    let node = position.node;

    if doc.is_text(node) {
        let Some(parent) = doc.parent(node) else {
            return Target::Structural(doc.root());
        };
        if doc.is_highlight_wrapper(parent) {
            let before: usize = doc
                .preceding_siblings(node)
                .filter(|&sib| doc.is_text(sib))
                .map(|sib| doc.text_len(sib))
                .sum();
            return match doc.parent(parent) {
                Some(grandparent) => Target::Member {
                    parent: grandparent,
                    member: parent,
                    offset: before + position.offset,
                },
                None => Target::Structural(doc.root()),
            };
        }
        return Target::Member {
            parent,
            member: node,
            offset: position.offset,
        };
    }

    if doc.is_highlight_wrapper(node) {
        if let Some(parent) = doc.parent(node) {
            return Target::Member {
                parent,
                member: node,
                offset: 0,
            };
        }
    }

    Target::Structural(node)
}

/// Resolve an anchor against the live tree
pub fn decode(doc: &Document, anchor: &Anchor) -> Result<Position, AnchorError> {
    let path = anchor.structural_path.to_string();
    let target = evaluate(doc, &anchor.structural_path)
        .ok_or_else(|| AnchorError::AnchorNotFound(path.clone()))?;

    let Some(run) = anchor.text_run_index else {
        return Ok(Position::new(target, 0));
    };

    let children = doc.children(target);
    if children.is_empty() {
        return Err(AnchorError::EmptyTarget(path));
    }

    let mut counter = RunCounter::new();
    let start = children
        .iter()
        .position(|&child| counter.visit(run_role(doc, child)) && counter.run() == run)
        .ok_or_else(|| AnchorError::RunNotFound {
            path: path.clone(),
            run,
        })?;

    let mut remaining = anchor.char_offset as usize;
    for &child in &children[start..] {
        match run_role(doc, child) {
            RunRole::Transparent => continue,
            RunRole::Break => break,
            RunRole::Text => {
                for text in run_texts(doc, child) {
                    let len = doc.text_len(text);
                    if len >= remaining {
                        return Ok(Position::new(text, remaining));
                    }
                    remaining -= len;
                }
            }
        }
    }

    Err(AnchorError::OffsetNotFound {
        path,
        run,
        offset: anchor.char_offset,
    })
}
