//! Database module for SQLite persistence
//!
//! Stores highlight and annotation anchors per item.

mod annotations;
mod highlights;
mod repository;
mod schema;

pub use annotations::*;
pub use highlights::*;
pub use repository::*;
pub use schema::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::anchor::{parse_path, Anchor};
use crate::error::{AppError, Result};

/// Create a new database connection pool
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // Run migrations
    initialize_schema(&pool).await?;

    Ok(pool)
}

/// Build an anchor from its stored columns
pub(crate) fn anchor_from_columns(
    table: &'static str,
    id: i64,
    path: &str,
    run: Option<i64>,
    offset: i64,
) -> Result<Anchor> {
    let malformed = |reason: String| AppError::MalformedRow { table, id, reason };

    let structural_path = parse_path(path).map_err(|e| malformed(e.to_string()))?;
    let text_run_index = match run {
        Some(run) if run >= 1 => {
            Some(u32::try_from(run).map_err(|_| malformed(format!("text run {} out of range", run)))?)
        }
        Some(run) => return Err(malformed(format!("text run {} must be at least 1", run))),
        None => None,
    };
    let char_offset =
        u32::try_from(offset).map_err(|_| malformed(format!("offset {} out of range", offset)))?;

    Ok(Anchor {
        structural_path,
        text_run_index,
        char_offset,
    })
}
