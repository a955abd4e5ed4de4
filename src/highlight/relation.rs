//! Boundary comparison between an existing interval and a selection

use std::cmp::Ordering;

use crate::anchor::encode;
use crate::dom::{compare_points, Document, Position, Range};

/// Compare two points by logical position.
///
/// Points that differ physically but encode to the same anchor (end of one
/// text fragment vs start of the next) compare equal.
pub fn compare_logical(doc: &Document, a: Position, b: Position) -> Ordering {
    let order = compare_points(doc, a, b);
    if order != Ordering::Equal && encode(doc, a) == encode(doc, b) {
        return Ordering::Equal;
    }
    order
}

/// The four boundary comparisons of an existing interval against a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryRelations {
    /// existing.start vs selection.start
    pub start_to_start: Ordering,
    /// existing.end vs selection.end
    pub end_to_end: Ordering,
    /// existing.start vs selection.end
    pub start_to_end: Ordering,
    /// existing.end vs selection.start
    pub end_to_start: Ordering,
}

impl BoundaryRelations {
    pub fn compute(doc: &Document, existing: &Range, selection: &Range) -> Self {
        Self {
            start_to_start: compare_logical(doc, existing.start, selection.start),
            end_to_end: compare_logical(doc, existing.end, selection.end),
            start_to_end: compare_logical(doc, existing.start, selection.end),
            end_to_start: compare_logical(doc, existing.end, selection.start),
        }
    }

    /// Existing interval covers the whole selection
    pub fn contains_selection(&self) -> bool {
        self.start_to_start != Ordering::Greater && self.end_to_end != Ordering::Less
    }

    /// Selection covers the whole existing interval
    pub fn within_selection(&self) -> bool {
        self.start_to_start != Ordering::Less && self.end_to_end != Ordering::Greater
    }

    /// Existing interval strictly surrounds the selection on both sides
    pub fn strictly_contains_selection(&self) -> bool {
        self.start_to_start == Ordering::Less && self.end_to_end == Ordering::Greater
    }

    /// No shared point, not even a touching boundary
    pub fn apart(&self) -> bool {
        self.start_to_end == Ordering::Greater || self.end_to_start == Ordering::Less
    }

    /// At most a touching boundary in common
    pub fn no_shared_text(&self) -> bool {
        self.start_to_end != Ordering::Less || self.end_to_start != Ordering::Greater
    }
}

/// How an existing interval relates to a new highlight request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlap {
    /// Request lies inside the existing interval
    Containing,
    /// Existing interval lies inside the request
    Contained,
    /// Existing interval holds the request's start
    StartIn,
    /// Existing interval holds the request's end
    EndIn,
    Disjoint,
}

/// Classify an existing interval for a highlight request.
///
/// Touching intervals are not disjoint, so adjacent highlights merge.
pub fn classify(relations: &BoundaryRelations) -> Overlap {
    if relations.contains_selection() {
        Overlap::Containing
    } else if relations.within_selection() {
        Overlap::Contained
    } else if relations.apart() {
        Overlap::Disjoint
    } else if relations.start_to_start == Ordering::Less {
        Overlap::StartIn
    } else {
        Overlap::EndIn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse_xhtml, NodeId, OverlayKind};

    fn setup() -> (Document, NodeId) {
        let doc = parse_xhtml("<p>abcdefghijklmnop</p>").unwrap();
        let p = doc.document_element().unwrap();
        let text = doc.children(p)[0];
        (doc, text)
    }

    fn range(text: NodeId, start: usize, end: usize) -> Range {
        Range::new(Position::new(text, start), Position::new(text, end))
    }

    fn classify_ranges(doc: &Document, existing: Range, selection: Range) -> Overlap {
        classify(&BoundaryRelations::compute(doc, &existing, &selection))
    }

    #[test]
    fn test_classification() {
        let (doc, t) = setup();
        let existing = range(t, 4, 8);

        assert_eq!(classify_ranges(&doc, existing, range(t, 5, 7)), Overlap::Containing);
        assert_eq!(classify_ranges(&doc, existing, range(t, 4, 8)), Overlap::Containing);
        assert_eq!(classify_ranges(&doc, existing, range(t, 2, 10)), Overlap::Contained);
        assert_eq!(classify_ranges(&doc, existing, range(t, 6, 12)), Overlap::StartIn);
        assert_eq!(classify_ranges(&doc, existing, range(t, 1, 6)), Overlap::EndIn);
        assert_eq!(classify_ranges(&doc, existing, range(t, 10, 12)), Overlap::Disjoint);
        assert_eq!(classify_ranges(&doc, existing, range(t, 0, 2)), Overlap::Disjoint);
    }

    #[test]
    fn test_touching_intervals_are_not_disjoint() {
        let (doc, t) = setup();
        let existing = range(t, 4, 8);

        assert_eq!(classify_ranges(&doc, existing, range(t, 8, 12)), Overlap::StartIn);
        assert_eq!(classify_ranges(&doc, existing, range(t, 0, 4)), Overlap::EndIn);
    }

    #[test]
    fn test_fragment_boundaries_compare_equal() {
        let (mut doc, t) = setup();
        let tail = doc.split_text(t, 4).unwrap();
        let p = doc.parent(tail).unwrap();
        let wrapper = doc.create_overlay(OverlayKind::Highlight);
        doc.insert_before(p, wrapper, Some(tail));
        doc.append_child(wrapper, tail);

        assert_eq!(
            compare_points(&doc, Position::new(t, 4), Position::new(tail, 0)),
            Ordering::Less
        );
        assert_eq!(
            compare_logical(&doc, Position::new(t, 4), Position::new(tail, 0)),
            Ordering::Equal
        );
    }
}
