//! Database schema initialization

use sqlx::SqlitePool;

use crate::error::Result;

/// Initialize the database schema
pub async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(SCHEMA_SQL).execute(pool).await?;

    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Floating notes, pinned by anchor
CREATE TABLE IF NOT EXISTS annotations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    item_id INTEGER NOT NULL,
    parent_path TEXT NOT NULL,
    text_run_index INTEGER,
    char_offset INTEGER NOT NULL DEFAULT 0,
    x REAL NOT NULL DEFAULT 0,
    y REAL NOT NULL DEFAULT 0,
    cols INTEGER NOT NULL,
    rows INTEGER NOT NULL,
    text TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_annotations_item_id ON annotations(item_id);

-- Highlighted intervals, one row per interval
CREATE TABLE IF NOT EXISTS highlights (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    item_id INTEGER NOT NULL,
    start_parent_path TEXT NOT NULL,
    start_text_run_index INTEGER,
    start_char_offset INTEGER NOT NULL DEFAULT 0,
    end_parent_path TEXT NOT NULL,
    end_text_run_index INTEGER,
    end_char_offset INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_highlights_item_id ON highlights(item_id);
"#;
