//! Range normalization
//!
//! A point can be written as "child #n of an element" or as "start of that
//! child". Both ends of every range are rewritten to the latter form before
//! any comparison so equivalent points never disagree.

use crate::dom::{Document, Position, Range};

/// Canonicalize a single boundary point.
///
/// - Element container, offset `n > 0` with a child at `n`: `(child, 0)`.
/// - Element container, offset past the last child: end of the last text
///   below it, or `(container, 0)` when it holds no text.
/// - Text container: offset clamped to the text length.
pub fn normalize_point(doc: &Document, point: Position) -> Position {
    if doc.is_text(point.node) {
        let len = doc.text_len(point.node);
        return Position::new(point.node, point.offset.min(len));
    }
    if point.offset == 0 {
        return point;
    }

    if let Some(&child) = doc.children(point.node).get(point.offset) {
        return Position::new(child, 0);
    }

    match doc.descendant_texts(point.node).last() {
        Some(&last) => Position::new(last, doc.text_len(last)),
        None => Position::new(point.node, 0),
    }
}

/// Canonicalize both ends of a range
pub fn normalize_range(doc: &Document, range: Range) -> Range {
    Range::new(
        normalize_point(doc, range.start),
        normalize_point(doc, range.end),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_xhtml;

    #[test]
    fn test_child_offset_becomes_child_start() {
        let doc = parse_xhtml("<p>one<b>two</b>three</p>").unwrap();
        let p = doc.document_element().unwrap();
        let b = doc.children(p)[1];

        assert_eq!(normalize_point(&doc, Position::new(p, 1)), Position::new(b, 0));
    }

    #[test]
    fn test_offset_past_end_becomes_text_end() {
        let doc = parse_xhtml("<p>one<b>two</b></p>").unwrap();
        let p = doc.document_element().unwrap();
        let b = doc.children(p)[1];
        let two = doc.children(b)[0];

        assert_eq!(normalize_point(&doc, Position::new(p, 2)), Position::new(two, 3));
    }

    #[test]
    fn test_text_and_zero_offsets_unchanged() {
        let doc = parse_xhtml("<p>one</p>").unwrap();
        let p = doc.document_element().unwrap();
        let one = doc.children(p)[0];

        assert_eq!(normalize_point(&doc, Position::new(p, 0)), Position::new(p, 0));
        assert_eq!(normalize_point(&doc, Position::new(one, 2)), Position::new(one, 2));
        assert_eq!(normalize_point(&doc, Position::new(one, 9)), Position::new(one, 3));
    }

    #[test]
    fn test_empty_element_collapses_to_start() {
        let doc = parse_xhtml("<p><img/></p>").unwrap();
        let p = doc.document_element().unwrap();

        assert_eq!(normalize_point(&doc, Position::new(p, 1)), Position::new(p, 0));
    }
}
