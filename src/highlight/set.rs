//! The set of highlighted intervals for one document

use tracing::debug;

use super::relation::{classify, BoundaryRelations, Overlap};
use super::types::{Highlight, HighlightId, RemoveMode};
use super::wrap::{peel, unwrap, wrap_range};
use crate::anchor::{decode, encode, Anchor};
use crate::dom::{Document, NodeId, Range, TextIndex};
use crate::error::AnchorError;
use crate::normalize::{normalize_point, normalize_range};

/// Pairwise non-overlapping highlighted intervals over one document
#[derive(Debug, Clone)]
pub struct HighlightSet {
    highlights: Vec<Highlight>,
    next_id: u64,
    color: String,
}

impl HighlightSet {
    pub fn new(color: impl Into<String>) -> Self {
        Self {
            highlights: Vec::new(),
            next_id: 1,
            color: color.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.highlights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.highlights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Highlight> {
        self.highlights.iter()
    }

    pub fn get(&self, id: HighlightId) -> Option<&Highlight> {
        self.highlights.iter().find(|h| h.id == id)
    }

    fn get_mut(&mut self, id: HighlightId) -> Option<&mut Highlight> {
        self.highlights.iter_mut().find(|h| h.id == id)
    }

    pub fn ids(&self) -> Vec<HighlightId> {
        self.highlights.iter().map(|h| h.id).collect()
    }

    fn bounds(&self, id: Option<HighlightId>) -> Option<(HighlightId, Anchor, Anchor)> {
        let highlight = self.get(id?)?;
        Some((highlight.id, highlight.start.clone(), highlight.end.clone()))
    }

    fn allocate(&mut self, start: Anchor, end: Anchor) -> HighlightId {
        let id = HighlightId(self.next_id);
        self.next_id += 1;
        self.highlights.push(Highlight {
            id,
            start,
            end,
            wrappers: Vec::new(),
        });
        id
    }

    /// Highlight a range, merging with any interval it touches.
    ///
    /// Returns the interval now covering the range, or `None` for a
    /// collapsed range. A range already inside an interval returns that
    /// interval without touching the tree.
    pub fn create(
        &mut self,
        doc: &mut Document,
        range: Range,
    ) -> Result<Option<HighlightId>, AnchorError> {
        let range = normalize_range(doc, range);
        if range.is_collapsed() {
            return Ok(None);
        }

        let mut contained = Vec::new();
        let mut start_in: Option<HighlightId> = None;
        let mut end_in: Option<HighlightId> = None;

        for highlight in &self.highlights {
            let existing = highlight.range(doc)?;
            let relations = BoundaryRelations::compute(doc, &existing, &range);
            match classify(&relations) {
                Overlap::Containing => {
                    debug!(id = %highlight.id, "range already highlighted");
                    return Ok(Some(highlight.id));
                }
                Overlap::Contained => contained.push(highlight.id),
                Overlap::StartIn => start_in = Some(highlight.id),
                Overlap::EndIn => end_in = Some(highlight.id),
                Overlap::Disjoint => {}
            }
        }

        let selection_start = encode(doc, range.start);
        let selection_end = encode(doc, range.end);
        if selection_start == selection_end {
            return Ok(None);
        }

        for id in contained {
            debug!(%id, "dropping interval inside new highlight");
            self.discard(doc, id);
        }

        // Re-home onto a touched interval, wrapping only the uncovered part
        let (home, wrap_from, wrap_to, interval) =
            match (self.bounds(start_in), self.bounds(end_in)) {
                (Some((s, s_start, s_end)), Some((e, _, e_end))) => {
                    if let Some(absorbed) = self.take(e) {
                        if let Some(home) = self.get_mut(s) {
                            home.add_wrappers(absorbed.wrappers);
                        }
                    }
                    debug!(home = %s, absorbed = %e, "bridging two intervals");
                    (s, s_end, e_end.clone(), (s_start, e_end))
                }
                (Some((s, s_start, s_end)), None) => {
                    debug!(home = %s, "extending interval forward");
                    (s, s_end, selection_end.clone(), (s_start, selection_end))
                }
                (None, Some((e, e_start, e_end))) => {
                    debug!(home = %e, "extending interval backward");
                    (e, selection_start.clone(), e_start, (selection_start, e_end))
                }
                (None, None) => {
                    let id = self.allocate(selection_start.clone(), selection_end.clone());
                    debug!(%id, "new interval");
                    (id, selection_start.clone(), selection_end.clone(), (selection_start, selection_end))
                }
            };

        let wrap = Range::new(decode(doc, &wrap_from)?, decode(doc, &wrap_to)?);
        let wrappers = wrap_range(doc, wrap, &self.color);

        if let Some(highlight) = self.get_mut(home) {
            highlight.add_wrappers(wrappers);
            highlight.start = interval.0;
            highlight.end = interval.1;
        }
        self.prune(doc);

        Ok(Some(home))
    }

    /// Re-apply a stored interval
    pub fn restore(
        &mut self,
        doc: &mut Document,
        start: &Anchor,
        end: &Anchor,
    ) -> Result<Option<HighlightId>, AnchorError> {
        let range = Range::new(decode(doc, start)?, decode(doc, end)?);
        self.create(doc, range)
    }

    /// Remove all or part of one interval
    pub fn remove(
        &mut self,
        doc: &mut Document,
        id: HighlightId,
        mode: RemoveMode,
    ) -> Result<(), AnchorError> {
        let (point, keep_head) = match mode {
            RemoveMode::All => {
                self.discard(doc, id);
                return Ok(());
            }
            RemoveMode::FromStartToPoint(point) => (point, false),
            RemoveMode::FromPointToEnd(point) => (point, true),
        };

        let point = normalize_point(doc, point);
        let Some(highlight) = self.get(id) else {
            return Ok(());
        };
        let range = highlight.range(doc)?;
        let wrappers = highlight.wrappers.clone();

        let index = TextIndex::build(doc, doc.root());
        let (Some(from), Some(to), Some(at)) = (
            index.offset_of(doc, range.start),
            index.offset_of(doc, range.end),
            index.offset_of(doc, point),
        ) else {
            return Ok(());
        };

        // A point outside the interval on the kept side removes nothing
        let untouched = if keep_head { at >= to } else { at <= from };
        if untouched {
            debug!(%id, at, from, to, "split point outside interval");
            return Ok(());
        }

        let (keep_from, keep_to) = if keep_head { (from, at) } else { (at, to) };
        if keep_from >= keep_to {
            debug!(%id, "nothing left of interval");
            self.discard(doc, id);
            return Ok(());
        }

        let point_anchor = encode(doc, point);
        if doc.is_text(point.node) && point.offset > 0 && point.offset < doc.text_len(point.node) {
            doc.split_text(point.node, point.offset);
        }
        let index = TextIndex::build(doc, doc.root());

        for wrapper in wrappers {
            peel(doc, wrapper, &index, keep_from, keep_to);
        }
        if let Some(highlight) = self.get_mut(id) {
            if keep_head {
                highlight.end = point_anchor;
            } else {
                highlight.start = point_anchor;
            }
        }
        self.prune(doc);

        debug!(%id, keep_from, keep_to, "truncated interval");
        Ok(())
    }

    /// Remove highlighting from a range, truncating or splitting intervals
    pub fn unhighlight(&mut self, doc: &mut Document, range: Range) -> Result<(), AnchorError> {
        let range = normalize_range(doc, range);
        if range.is_collapsed() {
            return Ok(());
        }
        let selection_start = encode(doc, range.start);
        let selection_end = encode(doc, range.end);
        if selection_start == selection_end {
            return Ok(());
        }

        for id in self.ids() {
            let Some((_, _, original_end)) = self.bounds(Some(id)) else {
                continue;
            };
            // Earlier iterations mutate the tree, so resolve everything fresh
            let existing = match self.get(id) {
                Some(highlight) => highlight.range(doc)?,
                None => continue,
            };
            let selection = Range::new(
                decode(doc, &selection_start)?,
                decode(doc, &selection_end)?,
            );
            let relations = BoundaryRelations::compute(doc, &existing, &selection);

            if relations.within_selection() {
                debug!(%id, "unhighlighting whole interval");
                self.discard(doc, id);
            } else if relations.strictly_contains_selection() {
                debug!(%id, "splitting interval");
                self.remove(doc, id, RemoveMode::FromPointToEnd(selection.start))?;
                let rest = Range::new(
                    decode(doc, &selection_end)?,
                    decode(doc, &original_end)?,
                );
                self.create(doc, rest)?;
            } else if relations.no_shared_text() {
                continue;
            } else if relations.start_to_start == std::cmp::Ordering::Less {
                self.remove(doc, id, RemoveMode::FromPointToEnd(selection.start))?;
            } else {
                self.remove(doc, id, RemoveMode::FromStartToPoint(selection.end))?;
            }
        }

        Ok(())
    }

    /// Unwrap every interval and empty the set
    pub fn clear(&mut self, doc: &mut Document) {
        for id in self.ids() {
            self.discard(doc, id);
        }
    }

    fn take(&mut self, id: HighlightId) -> Option<Highlight> {
        let index = self.highlights.iter().position(|h| h.id == id)?;
        Some(self.highlights.remove(index))
    }

    fn discard(&mut self, doc: &mut Document, id: HighlightId) {
        if let Some(highlight) = self.take(id) {
            for wrapper in highlight.wrappers {
                unwrap(doc, wrapper);
            }
        }
    }

    /// Forget wrappers that left the tree or lost all their text
    fn prune(&mut self, doc: &mut Document) {
        let empty: Vec<NodeId> = self
            .highlights
            .iter()
            .flat_map(|h| h.wrappers.iter().copied())
            .filter(|&w| doc.is_attached(w) && doc.children(w).is_empty())
            .collect();
        for wrapper in empty {
            doc.detach(wrapper);
        }
        for highlight in &mut self.highlights {
            highlight.wrappers.retain(|&w| doc.is_attached(w));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse_xhtml, NodeId, Position};

    const COLOR: &str = "#fff580";

    /// Character interval of each highlight, sorted
    fn intervals(set: &HighlightSet, doc: &Document) -> Vec<(usize, usize)> {
        let index = TextIndex::build(doc, doc.root());
        let mut out: Vec<(usize, usize)> = set
            .iter()
            .map(|h| {
                let range = h.range(doc).unwrap();
                (
                    index.offset_of(doc, range.start).unwrap(),
                    index.offset_of(doc, range.end).unwrap(),
                )
            })
            .collect();
        out.sort();
        out
    }

    /// Text nodes under the paragraph, with their absolute spans
    fn point(doc: &Document, p: NodeId, offset: usize) -> Position {
        let index = TextIndex::build(doc, p);
        for text in doc.descendant_texts(p) {
            let (s, e) = index.span(text).unwrap();
            if offset >= s && offset <= e {
                return Position::new(text, offset - s);
            }
        }
        panic!("offset {} out of range", offset);
    }

    fn range(doc: &Document, p: NodeId, start: usize, end: usize) -> Range {
        Range::new(point(doc, p, start), point(doc, p, end))
    }

    fn setup() -> (Document, NodeId, HighlightSet) {
        let doc = parse_xhtml("<p>abcdefghijklmnopqrst</p>").unwrap();
        let p = doc.document_element().unwrap();
        (doc, p, HighlightSet::new(COLOR))
    }

    /// Wrapped text under `p`, in order
    fn wrapped_text(doc: &Document, p: NodeId) -> Vec<String> {
        doc.children(p)
            .iter()
            .filter(|&&c| doc.is_highlight_wrapper(c))
            .map(|&c| doc.text_content(c))
            .collect()
    }

    #[test]
    fn test_create_simple() {
        let (mut doc, p, mut set) = setup();
        let r = range(&doc, p, 2, 5);

        let id = set.create(&mut doc, r).unwrap().unwrap();

        assert_eq!(intervals(&set, &doc), vec![(2, 5)]);
        assert_eq!(set.get(id).unwrap().text(&doc), "cde");
        assert_eq!(doc.text_content(p), "abcdefghijklmnopqrst");
    }

    #[test]
    fn test_collapsed_range_is_ignored() {
        let (mut doc, p, mut set) = setup();
        let r = range(&doc, p, 4, 4);

        assert_eq!(set.create(&mut doc, r).unwrap(), None);
        assert!(set.is_empty());
    }

    #[test]
    fn test_overlapping_highlights_merge() {
        let (mut doc, p, mut set) = setup();
        let first = range(&doc, p, 2, 5);
        let a = set.create(&mut doc, first).unwrap().unwrap();
        let second = range(&doc, p, 4, 8);
        let b = set.create(&mut doc, second).unwrap().unwrap();

        assert_eq!(a, b);
        assert_eq!(set.len(), 1);
        assert_eq!(intervals(&set, &doc), vec![(2, 8)]);
        assert_eq!(wrapped_text(&doc, p), vec!["cdefgh"]);
    }

    #[test]
    fn test_merge_backward() {
        let (mut doc, p, mut set) = setup();
        let first = range(&doc, p, 6, 10);
        set.create(&mut doc, first).unwrap();
        let second = range(&doc, p, 2, 8);
        set.create(&mut doc, second).unwrap();

        assert_eq!(intervals(&set, &doc), vec![(2, 10)]);
        assert_eq!(wrapped_text(&doc, p).concat(), "cdefghij");
    }

    #[test]
    fn test_adjacent_highlights_merge() {
        let (mut doc, p, mut set) = setup();
        let first = range(&doc, p, 2, 5);
        set.create(&mut doc, first).unwrap();
        let second = range(&doc, p, 5, 9);
        set.create(&mut doc, second).unwrap();

        assert_eq!(intervals(&set, &doc), vec![(2, 9)]);
    }

    #[test]
    fn test_bridge_two_intervals() {
        let (mut doc, p, mut set) = setup();
        let first = range(&doc, p, 1, 4);
        let a = set.create(&mut doc, first).unwrap().unwrap();
        let second = range(&doc, p, 8, 12);
        set.create(&mut doc, second).unwrap();

        let bridge = range(&doc, p, 3, 9);
        let merged = set.create(&mut doc, bridge).unwrap().unwrap();

        assert_eq!(merged, a);
        assert_eq!(intervals(&set, &doc), vec![(1, 12)]);
        assert_eq!(wrapped_text(&doc, p).concat(), "bcdefghijkl");
    }

    #[test]
    fn test_containing_interval_is_returned_unchanged() {
        let (mut doc, p, mut set) = setup();
        let outer = range(&doc, p, 0, 10);
        let a = set.create(&mut doc, outer).unwrap().unwrap();
        let before = doc.to_xhtml().unwrap();

        let inner = range(&doc, p, 3, 6);
        let b = set.create(&mut doc, inner).unwrap().unwrap();

        assert_eq!(a, b);
        assert_eq!(set.len(), 1);
        assert_eq!(doc.to_xhtml().unwrap(), before);
    }

    #[test]
    fn test_contained_intervals_are_absorbed() {
        let (mut doc, p, mut set) = setup();
        let small = range(&doc, p, 3, 5);
        set.create(&mut doc, small).unwrap();
        let other = range(&doc, p, 7, 8);
        set.create(&mut doc, other).unwrap();

        let big = range(&doc, p, 1, 12);
        set.create(&mut doc, big).unwrap();

        assert_eq!(intervals(&set, &doc), vec![(1, 12)]);
        assert_eq!(wrapped_text(&doc, p).concat(), "bcdefghijkl");
    }

    #[test]
    fn test_unhighlight_middle_splits() {
        let (mut doc, p, mut set) = setup();
        let whole = range(&doc, p, 0, 10);
        set.create(&mut doc, whole).unwrap();

        let middle = range(&doc, p, 3, 6);
        set.unhighlight(&mut doc, middle).unwrap();

        assert_eq!(intervals(&set, &doc), vec![(0, 3), (6, 10)]);
        assert_eq!(wrapped_text(&doc, p), vec!["abc", "ghij"]);
        assert_eq!(doc.text_content(p), "abcdefghijklmnopqrst");
    }

    #[test]
    fn test_unhighlight_edges() {
        let (mut doc, p, mut set) = setup();
        let whole = range(&doc, p, 2, 12);
        set.create(&mut doc, whole).unwrap();

        let head = range(&doc, p, 0, 5);
        set.unhighlight(&mut doc, head).unwrap();
        assert_eq!(intervals(&set, &doc), vec![(5, 12)]);

        let tail = range(&doc, p, 10, 15);
        set.unhighlight(&mut doc, tail).unwrap();
        assert_eq!(intervals(&set, &doc), vec![(5, 10)]);
        assert_eq!(wrapped_text(&doc, p), vec!["fghij"]);
    }

    #[test]
    fn test_unhighlight_covering_range_removes_intervals() {
        let (mut doc, p, mut set) = setup();
        let a = range(&doc, p, 2, 4);
        set.create(&mut doc, a).unwrap();
        let b = range(&doc, p, 6, 9);
        set.create(&mut doc, b).unwrap();

        let all = range(&doc, p, 0, 20);
        set.unhighlight(&mut doc, all).unwrap();

        assert!(set.is_empty());
        assert_eq!(doc.to_xhtml().unwrap().matches("data-marginalia").count(), 0);
    }

    #[test]
    fn test_unhighlight_adjacent_range_is_a_no_op() {
        let (mut doc, p, mut set) = setup();
        let a = range(&doc, p, 2, 5);
        set.create(&mut doc, a).unwrap();

        let next = range(&doc, p, 5, 9);
        set.unhighlight(&mut doc, next).unwrap();

        assert_eq!(intervals(&set, &doc), vec![(2, 5)]);
    }

    #[test]
    fn test_remove_modes() {
        let (mut doc, p, mut set) = setup();
        let whole = range(&doc, p, 2, 12);
        let id = set.create(&mut doc, whole).unwrap().unwrap();

        let at = point(&doc, p, 9);
        set.remove(&mut doc, id, RemoveMode::FromPointToEnd(at)).unwrap();
        assert_eq!(intervals(&set, &doc), vec![(2, 9)]);

        let at = point(&doc, p, 4);
        set.remove(&mut doc, id, RemoveMode::FromStartToPoint(at)).unwrap();
        assert_eq!(intervals(&set, &doc), vec![(4, 9)]);

        set.remove(&mut doc, id, RemoveMode::All).unwrap();
        assert!(set.is_empty());
        assert!(wrapped_text(&doc, p).is_empty());
    }

    #[test]
    fn test_remove_with_point_outside_interval() {
        let (mut doc, p, mut set) = setup();
        let r = range(&doc, p, 2, 5);
        let id = set.create(&mut doc, r).unwrap().unwrap();

        // Past the end: nothing to cut from the tail
        let at = point(&doc, p, 15);
        set.remove(&mut doc, id, RemoveMode::FromPointToEnd(at)).unwrap();
        assert_eq!(intervals(&set, &doc), vec![(2, 5)]);
        assert_eq!(wrapped_text(&doc, p), vec!["cde"]);

        // Before the start: nothing to cut from the head
        let at = point(&doc, p, 1);
        set.remove(&mut doc, id, RemoveMode::FromStartToPoint(at)).unwrap();
        assert_eq!(intervals(&set, &doc), vec![(2, 5)]);
        assert_eq!(wrapped_text(&doc, p), vec!["cde"]);

        // Text outside the interval can still be highlighted
        let r = range(&doc, p, 10, 13);
        set.create(&mut doc, r).unwrap().unwrap();
        assert_eq!(intervals(&set, &doc), vec![(2, 5), (10, 13)]);
        assert_eq!(doc.children(p).iter().filter(|&&c| doc.is_text(c)).count(), 3);
    }

    #[test]
    fn test_remove_past_the_far_side_drops_interval() {
        let (mut doc, p, mut set) = setup();
        let r = range(&doc, p, 2, 5);
        let id = set.create(&mut doc, r).unwrap().unwrap();

        let at = point(&doc, p, 12);
        set.remove(&mut doc, id, RemoveMode::FromStartToPoint(at)).unwrap();

        assert!(set.is_empty());
        assert!(wrapped_text(&doc, p).is_empty());
        assert_eq!(doc.text_content(p), "abcdefghijklmnopqrst");
    }

    #[test]
    fn test_restore_from_anchors() {
        let (mut doc, p, mut set) = setup();
        let r = range(&doc, p, 3, 7);
        let id = set.create(&mut doc, r).unwrap().unwrap();
        let (start, end) = {
            let h = set.get(id).unwrap();
            (h.start().clone(), h.end().clone())
        };

        let mut fresh = parse_xhtml("<p>abcdefghijklmnopqrst</p>").unwrap();
        let fresh_p = fresh.document_element().unwrap();
        let mut restored = HighlightSet::new(COLOR);
        restored.restore(&mut fresh, &start, &end).unwrap();

        assert_eq!(intervals(&restored, &fresh), vec![(3, 7)]);
        assert_eq!(wrapped_text(&fresh, fresh_p), vec!["defg"]);
    }

    #[test]
    fn test_intervals_never_overlap() {
        let (mut doc, p, mut set) = setup();
        let ops: [(bool, usize, usize); 8] = [
            (true, 1, 4),
            (true, 6, 9),
            (true, 12, 15),
            (false, 2, 3),
            (true, 3, 7),
            (false, 8, 13),
            (true, 16, 18),
            (true, 10, 11),
        ];
        for (add, s, e) in ops {
            let r = range(&doc, p, s, e);
            if add {
                set.create(&mut doc, r).unwrap();
            } else {
                set.unhighlight(&mut doc, r).unwrap();
            }

            let spans = intervals(&set, &doc);
            for pair in spans.windows(2) {
                assert!(pair[0].1 < pair[1].0, "overlap in {:?}", spans);
            }
            assert_eq!(doc.text_content(p), "abcdefghijklmnopqrst");
        }

        assert_eq!(
            intervals(&set, &doc),
            vec![(1, 2), (3, 8), (10, 11), (13, 15), (16, 18)]
        );
    }

    #[test]
    fn test_unrelated_paths_are_stable() {
        let mut doc = parse_xhtml("<div><p>first para</p><p>second para</p></div>").unwrap();
        let div = doc.document_element().unwrap();
        let p1 = doc.children(div)[0];
        let p2 = doc.children(div)[1];
        let before = crate::anchor::path_of(&doc, p2);

        let mut set = HighlightSet::new(COLOR);
        let r = range(&doc, p1, 2, 8);
        set.create(&mut doc, r).unwrap();

        assert_eq!(crate::anchor::path_of(&doc, p2), before);
        assert_eq!(
            encode(&doc, point(&doc, p2, 3)).structural_path.to_string(),
            "/div[1]/p[2]"
        );
    }
}
