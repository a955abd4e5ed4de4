//! Anchor value types
//!
//! An anchor never holds a node handle, only the path + run + offset triple,
//! so it survives a document being re-parsed with different overlay markup.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::path::{parse_path, PathParseError};

/// Persistent, markup-independent position descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anchor {
    /// Root-relative path to the structural node
    pub structural_path: StructuralPath,
    /// 1-based logical text run under the structural node; `None` targets
    /// the structural node itself
    pub text_run_index: Option<u32>,
    /// Character offset into the logical text run
    pub char_offset: u32,
}

impl Anchor {
    /// Anchor addressing a structural node directly
    pub fn structural(path: StructuralPath) -> Self {
        Self {
            structural_path: path,
            text_run_index: None,
            char_offset: 0,
        }
    }

    /// Anchor addressing a character inside a text run
    pub fn in_text(path: StructuralPath, run: u32, offset: u32) -> Self {
        Self {
            structural_path: path,
            text_run_index: Some(run),
            char_offset: offset,
        }
    }

    pub fn is_textual(&self) -> bool {
        self.text_run_index.is_some()
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.text_run_index {
            Some(run) => write!(f, "{}#{}:{}", self.structural_path, run, self.char_offset),
            None => write!(f, "{}", self.structural_path),
        }
    }
}

/// One `/tag[n]` segment of a structural path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathStep {
    /// Lower-cased tag name
    pub tag: String,
    /// 1-based index among same-tag, non-overlay siblings
    pub index: u32,
    /// Whether the step carries the overlay-exclusion predicate
    pub excludes_overlays: bool,
}

impl PathStep {
    pub fn new(tag: &str, index: u32) -> Self {
        let tag = tag.to_ascii_lowercase();
        let excludes_overlays = tag == crate::dom::OVERLAY_TAG;
        Self {
            tag,
            index,
            excludes_overlays,
        }
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.excludes_overlays {
            write!(
                f,
                "/{}[not(@{})][{}]",
                self.tag,
                crate::dom::OVERLAY_ATTRIBUTE,
                self.index
            )
        } else {
            write!(f, "/{}[{}]", self.tag, self.index)
        }
    }
}

/// Root-relative path of tag/index steps, outermost first.
///
/// Serialized as its string form, e.g. `/html[1]/body[1]/p[2]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StructuralPath {
    pub steps: Vec<PathStep>,
}

impl StructuralPath {
    /// The path of the document node itself
    pub fn root() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn with_steps(steps: Vec<PathStep>) -> Self {
        Self { steps }
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.steps.len()
    }
}

impl fmt::Display for StructuralPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return write!(f, "/");
        }
        for step in &self.steps {
            write!(f, "{}", step)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for StructuralPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_path(s)
    }
}

impl TryFrom<String> for StructuralPath {
    type Error = PathParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_path(&value)
    }
}

impl From<StructuralPath> for String {
    fn from(path: StructuralPath) -> Self {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_display() {
        let path = StructuralPath::with_steps(vec![
            PathStep::new("HTML", 1),
            PathStep::new("body", 1),
            PathStep::new("span", 3),
        ]);
        assert_eq!(
            path.to_string(),
            "/html[1]/body[1]/span[not(@data-marginalia)][3]"
        );
        assert_eq!(StructuralPath::root().to_string(), "/");
    }

    #[test]
    fn test_anchor_serializes_camel_case() {
        let anchor = Anchor::in_text(
            StructuralPath::with_steps(vec![PathStep::new("p", 2)]),
            1,
            7,
        );
        let json = serde_json::to_value(&anchor).unwrap();
        assert_eq!(json["structuralPath"], "/p[2]");
        assert_eq!(json["textRunIndex"], 1);
        assert_eq!(json["charOffset"], 7);

        let back: Anchor = serde_json::from_value(json).unwrap();
        assert_eq!(back, anchor);
    }

    #[test]
    fn test_structural_anchor_has_null_run() {
        let anchor = Anchor::structural(StructuralPath::root());
        let json = serde_json::to_string(&anchor).unwrap();
        assert!(json.contains("\"textRunIndex\":null"));
        assert!(!anchor.is_textual());
    }
}
