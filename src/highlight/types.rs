use serde::{Deserialize, Serialize};
use std::fmt;

use crate::anchor::{decode, Anchor};
use crate::dom::{Document, NodeId, Position, Range};
use crate::error::AnchorError;

/// In-memory identity of a highlighted interval (not the storage id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HighlightId(pub u64);

impl fmt::Display for HighlightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h{}", self.0)
    }
}

/// One highlighted interval and the wrapper elements realizing it
#[derive(Debug, Clone)]
pub struct Highlight {
    pub(crate) id: HighlightId,
    pub(crate) start: Anchor,
    pub(crate) end: Anchor,
    pub(crate) wrappers: Vec<NodeId>,
}

impl Highlight {
    pub fn id(&self) -> HighlightId {
        self.id
    }

    pub fn start(&self) -> &Anchor {
        &self.start
    }

    pub fn end(&self) -> &Anchor {
        &self.end
    }

    /// Wrapper elements currently in the tree for this interval
    pub fn wrappers(&self) -> &[NodeId] {
        &self.wrappers
    }

    /// Resolve both boundaries against the current tree
    pub fn range(&self, doc: &Document) -> Result<Range, AnchorError> {
        Ok(Range::new(
            decode(doc, &self.start)?,
            decode(doc, &self.end)?,
        ))
    }

    /// Highlighted text, concatenated across wrappers
    pub fn text(&self, doc: &Document) -> String {
        self.wrappers
            .iter()
            .filter(|&&w| doc.is_attached(w))
            .map(|&w| doc.text_content(w))
            .collect()
    }

    pub(crate) fn add_wrappers(&mut self, wrappers: impl IntoIterator<Item = NodeId>) {
        for wrapper in wrappers {
            if !self.wrappers.contains(&wrapper) {
                self.wrappers.push(wrapper);
            }
        }
    }
}

/// Which part of an interval to unhighlight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveMode {
    /// Unwrap the whole interval and drop it
    All,
    /// Remove from the interval start up to the point; keep the rest
    FromStartToPoint(Position),
    /// Remove from the point to the interval end; keep the rest
    FromPointToEnd(Position),
}
