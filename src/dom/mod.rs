//! Arena document tree
//!
//! The live, mutable tree that overlays are anchored into. Nodes live in a
//! flat arena and are addressed by [`NodeId`]; detaching a node never frees
//! its slot, so ids held across a mutation stay valid (they may simply point
//! at a node that is no longer attached).
//!
//! # Overlay markup
//!
//! Elements created by this crate carry the reserved attribute
//! [`OVERLAY_ATTRIBUTE`]:
//!
//! ```text
//! <span data-marginalia="highlight">wrapped text</span>
//! <span data-marginalia="annotation-marker"></span>
//! ```

mod parse;
mod range;
mod text_index;

pub use parse::parse_xhtml;
pub use range::{compare_points, Position, Range};
pub use text_index::TextIndex;

use std::cmp::Ordering;

/// Reserved attribute marking elements inserted by the overlay layer
pub const OVERLAY_ATTRIBUTE: &str = "data-marginalia";

/// Tag used for both highlight wrappers and annotation markers
pub const OVERLAY_TAG: &str = "span";

/// Identifier of a node within a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Kind of overlay element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    /// Wrapper span around highlighted text
    Highlight,
    /// Zero-width pin for a floating note
    AnnotationMarker,
}

impl OverlayKind {
    /// Value stored in the reserved attribute
    pub fn as_str(&self) -> &'static str {
        match self {
            OverlayKind::Highlight => "highlight",
            OverlayKind::AnnotationMarker => "annotation-marker",
        }
    }

    fn from_attribute(value: &str) -> Option<Self> {
        match value {
            "highlight" => Some(OverlayKind::Highlight),
            "annotation-marker" => Some(OverlayKind::AnnotationMarker),
            _ => None,
        }
    }
}

/// Element payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
}

/// Node payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// The document node (root of the tree)
    Document,
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A mutable document tree.
///
/// Slots of detached nodes are never reused, so the arena grows with every
/// text split and created overlay element. A document lives for one
/// session; reparse it to compact.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document containing only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// The document node
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The first element child of the document node
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(self.root())
            .iter()
            .copied()
            .find(|&child| self.is_element(child))
    }

    /// Number of nodes ever allocated (attached or not)
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    // ------------------------------------------------------------------
    // Classification
    // ------------------------------------------------------------------

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.node(id).data
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.node(id).data, NodeData::Text(_))
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).data, NodeData::Element(_))
    }

    /// Tag name of an element, `None` for text and document nodes
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Element(el) => Some(el.tag.as_str()),
            _ => None,
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Element(el) => el
                .attributes
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeData::Element(el) = &mut self.node_mut(id).data {
            match el.attributes.iter_mut().find(|(key, _)| key == name) {
                Some((_, existing)) => *existing = value.to_string(),
                None => el.attributes.push((name.to_string(), value.to_string())),
            }
        }
    }

    /// Overlay role of an element, if it carries the reserved attribute
    pub fn overlay_kind(&self, id: NodeId) -> Option<OverlayKind> {
        self.attribute(id, OVERLAY_ATTRIBUTE)
            .and_then(OverlayKind::from_attribute)
    }

    pub fn is_highlight_wrapper(&self, id: NodeId) -> bool {
        self.overlay_kind(id) == Some(OverlayKind::Highlight)
    }

    pub fn is_annotation_marker(&self, id: NodeId) -> bool {
        self.overlay_kind(id) == Some(OverlayKind::AnnotationMarker)
    }

    /// Content of a text node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Length of a text node in characters (0 for other nodes)
    pub fn text_len(&self, id: NodeId) -> usize {
        self.text(id).map(|t| t.chars().count()).unwrap_or(0)
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for text in self.descendant_texts(id) {
            out.push_str(self.text(text).unwrap_or_default());
        }
        out
    }

    /// Text nodes at or below `id`, in document order
    pub fn descendant_texts(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            if self.is_text(node) {
                out.push(node);
            }
            stack.extend(self.children(node).iter().rev());
        }
        out
    }

    // ------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// Position of `id` among its parent's children
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index
            .checked_sub(1)
            .map(|i| self.children(parent)[i])
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// Siblings before `id`, nearest first
    pub fn preceding_siblings(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let siblings: &[NodeId] = match (self.parent(id), self.index_in_parent(id)) {
            (Some(parent), Some(index)) => &self.children(parent)[..index],
            _ => &[],
        };
        siblings.iter().rev().copied()
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&node| self.parent(node))
    }

    /// True when `ancestor` is a proper ancestor of `node`
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|a| a == ancestor)
    }

    /// True when the node is reachable from the document node
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root() || self.ancestors(id).any(|a| a == self.root())
    }

    /// Lowest node that is `a` or `b` or an ancestor of both
    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        let chain: Vec<NodeId> = std::iter::once(a).chain(self.ancestors(a)).collect();
        std::iter::once(b)
            .chain(self.ancestors(b))
            .find(|node| chain.contains(node))
    }

    /// Compare two nodes in tree (pre-)order
    pub fn tree_order(&self, a: NodeId, b: NodeId) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        let path_a = self.path_from_root(a);
        let path_b = self.path_from_root(b);
        for (x, y) in path_a.iter().zip(path_b.iter()) {
            if x != y {
                return x.cmp(y);
            }
        }
        // One is an ancestor of the other; ancestors come first
        path_a.len().cmp(&path_b.len())
    }

    /// Child indices from the topmost ancestor down to `id`
    fn path_from_root(&self, id: NodeId) -> Vec<usize> {
        let mut path: Vec<usize> = std::iter::once(id)
            .chain(self.ancestors(id))
            .filter_map(|node| self.index_in_parent(node))
            .collect();
        path.reverse();
        path
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::Element(ElementData {
            tag: tag.to_string(),
            attributes: Vec::new(),
        }))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Text(text.to_string()))
    }

    /// Create an overlay element of the given kind
    pub fn create_overlay(&mut self, kind: OverlayKind) -> NodeId {
        let span = self.create_element(OVERLAY_TAG);
        self.set_attribute(span, OVERLAY_ATTRIBUTE, kind.as_str());
        span
    }

    /// Remove a node from its parent (the node keeps its subtree)
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node(id).parent {
            self.node_mut(parent).children.retain(|&c| c != id);
            self.node_mut(id).parent = None;
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    /// Insert `child` under `parent` before `reference` (or last when `None`
    /// or when `reference` is not a child of `parent`). Moves `child` if it
    /// is already attached somewhere.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        if child == parent || self.is_ancestor(child, parent) {
            return;
        }
        self.detach(child);
        let index = reference
            .and_then(|r| self.children(parent).iter().position(|&c| c == r))
            .unwrap_or_else(|| self.children(parent).len());
        self.node_mut(parent).children.insert(index, child);
        self.node_mut(child).parent = Some(parent);
    }

    /// Insert `node` directly after `reference` under the same parent
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) {
        if let Some(parent) = self.parent(reference) {
            let next = self.next_sibling(reference);
            self.insert_before(parent, node, next);
        }
    }

    /// Split a text node at a character offset.
    ///
    /// The original node keeps the head; the tail becomes a new text node
    /// inserted right after it. The offset is clamped to the text length.
    /// Returns the tail node, or `None` when `id` is not a text node.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Option<NodeId> {
        let text = self.text(id)?;
        let byte = text
            .char_indices()
            .nth(offset)
            .map(|(i, _)| i)
            .unwrap_or(text.len());
        let tail_text = text[byte..].to_string();
        if let NodeData::Text(head) = &mut self.node_mut(id).data {
            head.truncate(byte);
        }
        let tail = self.create_text(&tail_text);
        if self.parent(id).is_some() {
            self.insert_after(id, tail);
        }
        Some(tail)
    }

    /// Move every child of `element` in front of it, then detach it
    pub fn unwrap_element(&mut self, element: NodeId) {
        let Some(parent) = self.parent(element) else {
            return;
        };
        for child in self.children(element).to_vec() {
            self.insert_before(parent, child, Some(element));
        }
        self.detach(element);
    }

    /// Remove all overlay markup: wrappers are unwrapped, markers dropped.
    ///
    /// Returns the number of overlay elements removed.
    pub fn strip_overlays(&mut self) -> usize {
        let overlays: Vec<NodeId> = (0..self.nodes.len() as u32)
            .map(NodeId)
            .filter(|&id| self.overlay_kind(id).is_some() && self.is_attached(id))
            .collect();
        for &id in &overlays {
            match self.overlay_kind(id) {
                Some(OverlayKind::Highlight) => self.unwrap_element(id),
                _ => self.detach(id),
            }
        }
        overlays.len()
    }
}
