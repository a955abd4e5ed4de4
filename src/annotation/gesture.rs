//! In-flight pointer gestures on notes
//!
//! At most one gesture is active per session. It is created when the user
//! grabs a note's resize handle or move button and is dropped on release,
//! on the next unrelated action, or when focus is lost.

use super::AnnotationKey;

/// A page-space point in pixels
pub type Point = (f64, f64);

/// Active gesture token
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    /// Dragging a note's resize handle
    Resize(ResizeGesture),
    /// Waiting for a click that re-pins the note
    Move { annotation: AnnotationKey },
}

impl Gesture {
    pub fn annotation(&self) -> AnnotationKey {
        match self {
            Gesture::Resize(resize) => resize.annotation,
            Gesture::Move { annotation } => *annotation,
        }
    }
}

/// State captured when a resize drag starts
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeGesture {
    pub annotation: AnnotationKey,
    pub origin: Point,
    pub start_cols: u32,
    pub start_rows: u32,
    /// Width and height of one text cell in pixels
    pub cell: (f64, f64),
}

impl ResizeGesture {
    /// Note size for the pointer at `point`, never below the minimums
    pub fn size_at(&self, point: Point, min_cols: u32, min_rows: u32) -> (u32, u32) {
        let cols = grow(self.start_cols, point.0 - self.origin.0, self.cell.0);
        let rows = grow(self.start_rows, point.1 - self.origin.1, self.cell.1);
        (cols.max(min_cols), rows.max(min_rows))
    }
}

fn grow(start: u32, delta: f64, cell: f64) -> u32 {
    if cell <= 0.0 || !delta.is_finite() {
        return start;
    }
    let steps = (delta / cell).floor() as i64;
    (start as i64 + steps).clamp(0, u32::MAX as i64) as u32
}
