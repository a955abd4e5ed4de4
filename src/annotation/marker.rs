//! Zero-width marker pins for floating notes

use tracing::trace;

use crate::anchor::{decode, encode, Anchor};
use crate::dom::{Document, NodeId, OverlayKind, Position};
use crate::error::AnchorError;
use crate::normalize::normalize_point;

/// The point a note is pinned to.
///
/// Inside text the pin is a marker element inserted at the point. At the
/// start of a text node, or on an element, the pin is the enclosing element
/// itself and no markup is added. At most one marker element exists per
/// pin at any time.
#[derive(Debug, Clone, Default)]
pub struct AnnotationMarker {
    pin: Option<NodeId>,
}

impl AnnotationMarker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Node the note is currently pinned to
    pub fn pin(&self) -> Option<NodeId> {
        self.pin
    }

    /// Whether the pin is an inserted marker element
    pub fn has_marker_element(&self, doc: &Document) -> bool {
        self.pin
            .map(|pin| doc.is_annotation_marker(pin))
            .unwrap_or(false)
    }

    /// Pin to a live position, replacing any previous marker
    pub fn place(&mut self, doc: &mut Document, position: Position) -> Result<Anchor, AnchorError> {
        let anchor = encode(doc, normalize_point(doc, position));
        self.resolve(doc, &anchor)?;
        Ok(self.anchor(doc).unwrap_or(anchor))
    }

    /// Re-establish the pin from a stored anchor
    pub fn resolve(&mut self, doc: &mut Document, anchor: &Anchor) -> Result<Position, AnchorError> {
        self.clear(doc);
        let position = decode(doc, anchor)?;
        self.pin = Some(pin_at(doc, position));
        trace!(%anchor, pin = ?self.pin, "pinned note");
        Ok(position)
    }

    /// Anchor of the current pin
    pub fn anchor(&self, doc: &Document) -> Option<Anchor> {
        let pin = self.pin?;
        doc.is_attached(pin)
            .then(|| encode(doc, Position::new(pin, 0)))
    }

    /// Remove the marker element, if any, and forget the pin
    pub fn clear(&mut self, doc: &mut Document) {
        if let Some(pin) = self.pin.take() {
            if doc.is_annotation_marker(pin) {
                doc.detach(pin);
            }
        }
    }
}

fn pin_at(doc: &mut Document, position: Position) -> NodeId {
    if !doc.is_text(position.node) {
        return position.node;
    }

    if position.offset == 0 {
        return doc
            .ancestors(position.node)
            .find(|&a| doc.overlay_kind(a).is_none())
            .unwrap_or_else(|| doc.root());
    }

    if position.offset < doc.text_len(position.node) {
        doc.split_text(position.node, position.offset);
    }
    let marker = doc.create_overlay(OverlayKind::AnnotationMarker);
    doc.insert_after(position.node, marker);
    marker
}
