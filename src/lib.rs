//! Marginalia
//!
//! Highlights and floating notes over a mutable document tree, recorded as
//! anchors that survive overlay markup and reload.
//!
//! # Modules
//!
//! - `dom`: Arena document tree with text splitting and boundary points
//! - `anchor`: Markup-independent position codec
//! - `highlight`: Non-overlapping highlighted intervals
//! - `annotation`: Notes pinned by zero-width markers
//! - `session`: Per-document coordinator with load and save
//! - `db`: SQLite persistence

pub mod anchor;
pub mod annotation;
pub mod config;
pub mod db;
pub mod dom;
pub mod error;
pub mod highlight;
pub mod html;
pub mod normalize;
pub mod session;

pub use anchor::{Anchor, StructuralPath};
pub use annotation::{Annotation, AnnotationKey, Layout};
pub use config::Config;
pub use dom::{parse_xhtml, Document, NodeId, Position, Range};
pub use error::{AnchorError, AppError, Result};
pub use highlight::{HighlightId, HighlightSet};
pub use session::AnnotationSession;
