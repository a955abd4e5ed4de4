//! Highlight rows

use serde::{Deserialize, Serialize};

use super::anchor_from_columns;
use crate::anchor::Anchor;
use crate::error::Result;

/// Highlight record as stored
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct HighlightRow {
    pub id: i64,
    pub item_id: i64,
    pub start_parent_path: String,
    pub start_text_run_index: Option<i64>,
    pub start_char_offset: i64,
    pub end_parent_path: String,
    pub end_text_run_index: Option<i64>,
    pub end_char_offset: i64,
}

impl HighlightRow {
    /// Validate the row and build its boundary anchors
    pub fn anchors(&self) -> Result<(Anchor, Anchor)> {
        let start = anchor_from_columns(
            "highlights",
            self.id,
            &self.start_parent_path,
            self.start_text_run_index,
            self.start_char_offset,
        )?;
        let end = anchor_from_columns(
            "highlights",
            self.id,
            &self.end_parent_path,
            self.end_text_run_index,
            self.end_char_offset,
        )?;
        Ok((start, end))
    }
}

/// Highlight to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightRecord {
    pub start: Anchor,
    pub end: Anchor,
}
