//! Anchor codec
//!
//! Converts live tree positions to persistent [`Anchor`]s and back.
//!
//! # Anchor format
//!
//! ```text
//! /html[1]/body[1]/p[3]   #2      :14
//! │                       │       └── character offset into the run
//! │                       └────────── logical text run (1-based, or none)
//! └────────────────────────────────── structural path, overlays skipped
//! ```
//!
//! A logical text run is a maximal stretch of text under the structural
//! node, interrupted only by ordinary elements. Highlight wrappers count as
//! their text, markers count as nothing, so the same logical point always
//! encodes the same way whatever overlay markup is present.
//!
//! # Usage
//!
//! ```ignore
//! use marginalia::anchor::{decode, encode};
//!
//! let anchor = encode(&doc, position);
//! let again = decode(&doc, &anchor)?;
//! ```

mod codec;
mod path;
mod runs;
mod types;

pub use codec::{decode, encode};
pub use path::{evaluate, parse_path, path_of, PathParseError};
pub use runs::{counts_toward_path, run_len, run_role, run_texts, RunCounter, RunRole};
pub use types::{Anchor, PathStep, StructuralPath};
