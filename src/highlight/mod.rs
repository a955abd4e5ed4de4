//! Highlight interval algebra
//!
//! Keeps a set of disjoint highlighted intervals over a document and the
//! wrapper markup realizing them. New highlights merge with anything they
//! overlap or touch; unhighlighting truncates or splits intervals.
//!
//! ```text
//! existing:      [====]            [=====]
//! request:          [=========]
//! result:        [==================]        (one interval, wrappers reused)
//! ```

mod relation;
mod set;
mod types;
mod wrap;

pub use relation::{classify, compare_logical, BoundaryRelations, Overlap};
pub use set::HighlightSet;
pub use types::{Highlight, HighlightId, RemoveMode};
pub use wrap::{wrap_range, wrap_text_node, wrapper_style};
