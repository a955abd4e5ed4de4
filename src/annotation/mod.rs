//! Floating notes pinned to document positions

mod gesture;
mod marker;

pub use gesture::{Gesture, Point, ResizeGesture};
pub use marker::AnnotationMarker;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::anchor::Anchor;
use crate::dom::{Document, NodeId};

/// In-memory identity of a note within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnnotationKey(pub u64);

impl fmt::Display for AnnotationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Interface to whatever renders the document
pub trait Layout {
    /// Page coordinates of a node's top-left corner
    fn pixel_offset(&self, doc: &Document, node: NodeId) -> Point;

    /// Width of the visible area
    fn viewport_width(&self) -> f64;

    /// Rendered width of a note box with the given column count
    fn note_width(&self, cols: u32) -> f64;

    /// Size of one text cell inside a note box
    fn cell_size(&self) -> (f64, f64);
}

/// A floating note
#[derive(Debug, Clone)]
pub struct Annotation {
    pub(crate) key: AnnotationKey,
    /// Storage id, assigned on first save
    pub(crate) id: Option<i64>,
    pub(crate) marker: AnnotationMarker,
    /// Offset of the note box from the pin, in pixels
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) cols: u32,
    pub(crate) rows: u32,
    pub(crate) text: String,
    pub(crate) z_index: u32,
    pub(crate) collapsed: bool,
}

impl Annotation {
    pub(crate) fn new(key: AnnotationKey, cols: u32, rows: u32, z_index: u32) -> Self {
        Self {
            key,
            id: None,
            marker: AnnotationMarker::new(),
            x: 0.0,
            y: 0.0,
            cols,
            rows,
            text: String::new(),
            z_index,
            collapsed: false,
        }
    }

    pub fn key(&self) -> AnnotationKey {
        self.key
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn offset(&self) -> Point {
        (self.x, self.y)
    }

    pub fn size(&self) -> (u32, u32) {
        (self.cols, self.rows)
    }

    pub fn z_index(&self) -> u32 {
        self.z_index
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn marker(&self) -> &AnnotationMarker {
        &self.marker
    }

    pub fn anchor(&self, doc: &Document) -> Option<Anchor> {
        self.marker.anchor(doc)
    }

    /// Absolute on-page placement of the note box
    pub fn placement(
        &self,
        doc: &Document,
        layout: &dyn Layout,
        color: &str,
    ) -> Option<NotePlacement> {
        let pin = self.marker.pin()?;
        let (pin_x, pin_y) = layout.pixel_offset(doc, pin);
        let left = pin_x + self.x;
        let top = pin_y + self.y;
        let width = layout.note_width(self.cols);

        // Flip to the left of the anchor point instead of overflowing
        let left = if left + width > layout.viewport_width() {
            left - width
        } else {
            left
        };

        Some(NotePlacement {
            key: self.key,
            left,
            top,
            z_index: self.z_index,
            collapsed: self.collapsed,
            color: color.to_string(),
        })
    }
}

/// Where a note box is drawn
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePlacement {
    pub key: AnnotationKey,
    pub left: f64,
    pub top: f64,
    pub z_index: u32,
    pub collapsed: bool,
    pub color: String,
}
