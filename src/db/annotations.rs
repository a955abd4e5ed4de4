//! Annotation rows

use serde::{Deserialize, Serialize};

use super::anchor_from_columns;
use crate::anchor::Anchor;
use crate::error::{AppError, Result};

/// Annotation record as stored
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AnnotationRow {
    pub id: i64,
    pub item_id: i64,
    pub parent_path: String,
    pub text_run_index: Option<i64>,
    pub char_offset: i64,
    pub x: f64,
    pub y: f64,
    pub cols: i64,
    pub rows: i64,
    pub text: String,
}

impl AnnotationRow {
    pub fn anchor(&self) -> Result<Anchor> {
        anchor_from_columns(
            "annotations",
            self.id,
            &self.parent_path,
            self.text_run_index,
            self.char_offset,
        )
    }

    /// Note size, rejecting values that do not fit
    pub fn size(&self) -> Result<(u32, u32)> {
        let malformed = |reason: &str| AppError::MalformedRow {
            table: "annotations",
            id: self.id,
            reason: reason.to_string(),
        };
        let cols = u32::try_from(self.cols).map_err(|_| malformed("cols out of range"))?;
        let rows = u32::try_from(self.rows).map_err(|_| malformed("rows out of range"))?;
        Ok((cols, rows))
    }
}

/// Annotation to be written; `id` is `None` for notes never saved
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRecord {
    pub id: Option<i64>,
    pub anchor: Anchor,
    pub x: f64,
    pub y: f64,
    pub cols: u32,
    pub rows: u32,
    pub text: String,
}
