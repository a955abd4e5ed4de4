//! Error types for Marginalia

use thiserror::Error;

use crate::anchor::PathParseError;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Failure to turn a stored anchor back into a live position.
///
/// These are recoverable: the caller decides whether to skip the overlay
/// or surface the problem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnchorError {
    #[error("No node matches path {0}")]
    AnchorNotFound(String),

    #[error("Node at {0} has no children to anchor into")]
    EmptyTarget(String),

    #[error("Text run {run} not found under {path}")]
    RunNotFound { path: String, run: u32 },

    #[error("Offset {offset} is past the end of text run {run} under {path}")]
    OffsetNotFound { path: String, run: u32, offset: u32 },
}

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Anchor error: {0}")]
    Anchor(#[from] AnchorError),

    #[error("Invalid path: {0}")]
    Path(#[from] PathParseError),

    #[error("Malformed {table} row {id}: {reason}")]
    MalformedRow {
        table: &'static str,
        id: i64,
        reason: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("XML parsing error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("HTML sanitation error: {0}")]
    Sanitize(#[from] crate::html::SanitizeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
