//! Structural path parsing and evaluation
//!
//! Grammar:
//! ```text
//! path      = "/" | step+
//! step      = "/" tag predicate? "[" number "]"
//! predicate = "[not(@" attribute ")]"
//! tag       = [A-Za-z][A-Za-z0-9_.:-]*
//! ```
//!
//! Indices are 1-based and count only same-tag siblings that do not carry
//! the overlay attribute.

use thiserror::Error;

use super::runs::counts_toward_path;
use super::types::{PathStep, StructuralPath};
use crate::dom::{Document, NodeId, OVERLAY_ATTRIBUTE};

/// Structural path parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathParseError {
    #[error("Empty structural path")]
    Empty,

    #[error("Expected '/' at position {0}")]
    ExpectedStep(usize),

    #[error("Expected tag name at position {0}")]
    ExpectedTag(usize),

    #[error("Expected number at position {0}")]
    ExpectedNumber(usize),

    #[error("Unknown predicate at position {0}")]
    UnknownPredicate(usize),

    #[error("Unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),

    #[error("Index must be at least 1 at position {0}")]
    ZeroIndex(usize),
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), PathParseError> {
        if self.skip_if(expected) {
            Ok(())
        } else {
            Err(PathParseError::UnexpectedChar(
                self.peek().unwrap_or('\0'),
                self.pos,
            ))
        }
    }

    fn skip_str(&mut self, s: &str) -> bool {
        if self.input[self.pos..].starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn parse_number(&mut self) -> Result<u32, PathParseError> {
        let start = self.pos;
        while matches!(self.peek(), Some(ch) if ch.is_ascii_digit()) {
            self.advance();
        }
        if self.pos == start {
            return Err(PathParseError::ExpectedNumber(start));
        }
        self.input[start..self.pos]
            .parse()
            .map_err(|_| PathParseError::ExpectedNumber(start))
    }

    fn parse_tag(&mut self) -> Result<String, PathParseError> {
        let start = self.pos;
        match self.peek() {
            Some(ch) if ch.is_ascii_alphabetic() => {
                self.advance();
            }
            _ => return Err(PathParseError::ExpectedTag(start)),
        }
        while matches!(
            self.peek(),
            Some(ch) if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | ':' | '-')
        ) {
            self.advance();
        }
        Ok(self.input[start..self.pos].to_ascii_lowercase())
    }

    fn parse_step(&mut self) -> Result<PathStep, PathParseError> {
        if !self.skip_if('/') {
            return Err(PathParseError::ExpectedStep(self.pos));
        }
        let tag = self.parse_tag()?;

        self.expect('[')?;
        let mut excludes_overlays = false;
        if self.peek() == Some('n') {
            let predicate_start = self.pos;
            let predicate = format!("not(@{})]", OVERLAY_ATTRIBUTE);
            if !self.skip_str(&predicate) {
                return Err(PathParseError::UnknownPredicate(predicate_start));
            }
            excludes_overlays = true;
            self.expect('[')?;
        }

        let index_start = self.pos;
        let index = self.parse_number()?;
        if index == 0 {
            return Err(PathParseError::ZeroIndex(index_start));
        }
        self.expect(']')?;

        Ok(PathStep {
            tag,
            index,
            excludes_overlays,
        })
    }
}

/// Parse a structural path string
pub fn parse_path(input: &str) -> Result<StructuralPath, PathParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(PathParseError::Empty);
    }
    if input == "/" {
        return Ok(StructuralPath::root());
    }

    let mut parser = Parser::new(input);
    let mut steps = Vec::new();
    while !parser.at_end() {
        steps.push(parser.parse_step()?);
    }

    Ok(StructuralPath::with_steps(steps))
}

/// Build the structural path of `node` by ascending to the document node.
///
/// At each level the index counts preceding same-tag siblings, skipping
/// overlay elements entirely.
pub fn path_of(doc: &Document, node: NodeId) -> StructuralPath {
    let mut steps = Vec::new();
    let mut current = node;
    while let Some(parent) = doc.parent(current) {
        if let Some(tag) = doc.tag_name(current) {
            let index = 1 + doc
                .preceding_siblings(current)
                .filter(|&sib| counts_toward_path(doc, sib))
                .filter(|&sib| {
                    doc.tag_name(sib)
                        .map(|t| t.eq_ignore_ascii_case(tag))
                        .unwrap_or(false)
                })
                .count() as u32;
            steps.push(PathStep::new(tag, index));
        }
        current = parent;
    }
    steps.reverse();
    StructuralPath::with_steps(steps)
}

/// Resolve a structural path against the document.
///
/// Returns `None` when any step has no matching element.
pub fn evaluate(doc: &Document, path: &StructuralPath) -> Option<NodeId> {
    let mut current = doc.root();
    for step in &path.steps {
        current = doc
            .children(current)
            .iter()
            .copied()
            .filter(|&child| counts_toward_path(doc, child))
            .filter(|&child| {
                doc.tag_name(child)
                    .map(|t| t.eq_ignore_ascii_case(&step.tag))
                    .unwrap_or(false)
            })
            .nth((step.index as usize).checked_sub(1)?)?;
    }
    Some(current)
}
