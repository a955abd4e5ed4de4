use std::collections::HashMap;

use super::{Document, NodeId, Position};

/// Character spans of every text node under a root, in document order.
///
/// Built once per mutation step so that "is this text inside the range"
/// becomes an interval test instead of repeated point comparisons.
#[derive(Debug, Clone, Default)]
pub struct TextIndex {
    spans: HashMap<NodeId, (usize, usize)>,
    order: Vec<NodeId>,
}

impl TextIndex {
    pub fn build(doc: &Document, root: NodeId) -> Self {
        let mut spans = HashMap::new();
        let mut order = Vec::new();
        let mut cursor = 0;
        for text in doc.descendant_texts(root) {
            let len = doc.text_len(text);
            spans.insert(text, (cursor, cursor + len));
            order.push(text);
            cursor += len;
        }
        Self { spans, order }
    }

    /// `[start, end)` character span of a text node
    pub fn span(&self, text: NodeId) -> Option<(usize, usize)> {
        self.spans.get(&text).copied()
    }

    /// Absolute character offset of a boundary point.
    ///
    /// Element positions resolve to the start of the first text at or after
    /// the addressed child (or the end of the element's text when the offset
    /// is past its last child).
    pub fn offset_of(&self, doc: &Document, pos: Position) -> Option<usize> {
        if let Some((start, end)) = self.span(pos.node) {
            return Some((start + pos.offset).min(end));
        }
        let children = doc.children(pos.node);
        if let Some(&child) = children.get(pos.offset) {
            if let Some(first) = doc.descendant_texts(child).first() {
                return self.span(*first).map(|(start, _)| start);
            }
            // Childless element: use the end of whatever text precedes it
            return Some(self.end_before(doc, child));
        }
        match doc.descendant_texts(pos.node).last() {
            Some(last) => self.span(*last).map(|(_, end)| end),
            None => Some(self.end_before(doc, pos.node)),
        }
    }

    /// End offset of the last indexed text strictly before `node`
    fn end_before(&self, doc: &Document, node: NodeId) -> usize {
        self.order
            .iter()
            .take_while(|&&text| doc.tree_order(text, node).is_lt())
            .filter(|&&text| !doc.is_ancestor(node, text))
            .filter_map(|text| self.span(*text))
            .map(|(_, end)| end)
            .last()
            .unwrap_or(0)
    }

    /// Text nodes that overlap `[start, end)` with a non-empty span
    pub fn texts_within(&self, start: usize, end: usize) -> Vec<NodeId> {
        self.order
            .iter()
            .copied()
            .filter(|text| match self.span(*text) {
                Some((s, e)) => s < e && s < end && e > start,
                None => false,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_accumulate_in_document_order() {
        let mut doc = Document::new();
        let p = doc.create_element("p");
        let a = doc.create_text("abc");
        let em = doc.create_element("em");
        let b = doc.create_text("de");
        let c = doc.create_text("fgh");
        let root = doc.root();
        doc.append_child(root, p);
        doc.append_child(p, a);
        doc.append_child(p, em);
        doc.append_child(em, b);
        doc.append_child(p, c);

        let index = TextIndex::build(&doc, root);

        assert_eq!(index.span(a), Some((0, 3)));
        assert_eq!(index.span(b), Some((3, 5)));
        assert_eq!(index.span(c), Some((5, 8)));
        assert_eq!(index.offset_of(&doc, Position::new(c, 1)), Some(6));
        assert_eq!(index.offset_of(&doc, Position::new(p, 1)), Some(3));
        assert_eq!(index.offset_of(&doc, Position::new(p, 3)), Some(8));
        assert_eq!(index.texts_within(2, 6), vec![a, b, c]);
        assert_eq!(index.texts_within(3, 5), vec![b]);
    }
}
