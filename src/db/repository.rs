//! Overlay persistence for one item at a time

use sqlx::SqlitePool;
use tracing::info;

use super::annotations::{AnnotationRecord, AnnotationRow};
use super::highlights::{HighlightRecord, HighlightRow};
use crate::error::Result;

/// Overlay repository
pub struct OverlayRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OverlayRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the overlay tables if missing
    pub async fn init(&self) -> Result<()> {
        super::initialize_schema(self.pool).await
    }

    /// List highlight rows for an item, oldest first
    pub async fn list_highlights(&self, item_id: i64) -> Result<Vec<HighlightRow>> {
        let rows = sqlx::query_as::<_, HighlightRow>(
            r#"
            SELECT id, item_id, start_parent_path, start_text_run_index, start_char_offset,
                   end_parent_path, end_text_run_index, end_char_offset
            FROM highlights
            WHERE item_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(item_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// List annotation rows for an item, oldest first
    pub async fn list_annotations(&self, item_id: i64) -> Result<Vec<AnnotationRow>> {
        let rows = sqlx::query_as::<_, AnnotationRow>(
            r#"
            SELECT id, item_id, parent_path, text_run_index, char_offset,
                   x, y, cols, rows, text
            FROM annotations
            WHERE item_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(item_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Replace the stored overlays of an item in one transaction.
    ///
    /// Highlight rows are rewritten wholesale; annotations are upserted and
    /// the ids in `deleted` removed. Returns the storage id of every record
    /// in `annotations`, in order. Nothing is written if any step fails.
    pub async fn save_item(
        &self,
        item_id: i64,
        highlights: &[HighlightRecord],
        annotations: &[AnnotationRecord],
        deleted: &[i64],
    ) -> Result<Vec<i64>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM highlights WHERE item_id = ?")
            .bind(item_id)
            .execute(&mut *tx)
            .await?;

        for highlight in highlights {
            sqlx::query(
                r#"
                INSERT INTO highlights (
                    item_id, start_parent_path, start_text_run_index, start_char_offset,
                    end_parent_path, end_text_run_index, end_char_offset
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(item_id)
            .bind(highlight.start.structural_path.to_string())
            .bind(highlight.start.text_run_index.map(i64::from))
            .bind(i64::from(highlight.start.char_offset))
            .bind(highlight.end.structural_path.to_string())
            .bind(highlight.end.text_run_index.map(i64::from))
            .bind(i64::from(highlight.end.char_offset))
            .execute(&mut *tx)
            .await?;
        }

        for id in deleted {
            sqlx::query("DELETE FROM annotations WHERE id = ? AND item_id = ?")
                .bind(id)
                .bind(item_id)
                .execute(&mut *tx)
                .await?;
        }

        let mut ids = Vec::with_capacity(annotations.len());
        for record in annotations {
            let path = record.anchor.structural_path.to_string();
            let run = record.anchor.text_run_index.map(i64::from);
            let offset = i64::from(record.anchor.char_offset);

            match record.id {
                Some(id) => {
                    sqlx::query(
                        r#"
                        UPDATE annotations
                        SET parent_path = ?, text_run_index = ?, char_offset = ?,
                            x = ?, y = ?, cols = ?, rows = ?, text = ?
                        WHERE id = ? AND item_id = ?
                        "#,
                    )
                    .bind(&path)
                    .bind(run)
                    .bind(offset)
                    .bind(record.x)
                    .bind(record.y)
                    .bind(i64::from(record.cols))
                    .bind(i64::from(record.rows))
                    .bind(&record.text)
                    .bind(id)
                    .bind(item_id)
                    .execute(&mut *tx)
                    .await?;
                    ids.push(id);
                }
                None => {
                    let result = sqlx::query(
                        r#"
                        INSERT INTO annotations (
                            item_id, parent_path, text_run_index, char_offset,
                            x, y, cols, rows, text
                        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                        "#,
                    )
                    .bind(item_id)
                    .bind(&path)
                    .bind(run)
                    .bind(offset)
                    .bind(record.x)
                    .bind(record.y)
                    .bind(i64::from(record.cols))
                    .bind(i64::from(record.rows))
                    .bind(&record.text)
                    .execute(&mut *tx)
                    .await?;
                    ids.push(result.last_insert_rowid());
                }
            }
        }

        tx.commit().await?;

        info!(
            item_id,
            highlights = highlights.len(),
            annotations = annotations.len(),
            deleted = deleted.len(),
            "saved overlays"
        );
        Ok(ids)
    }

    /// Count highlight rows for an item
    pub async fn count_highlights(&self, item_id: i64) -> Result<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM highlights WHERE item_id = ?")
            .bind(item_id)
            .fetch_one(self.pool)
            .await?;

        Ok(result.0)
    }

    /// Count annotation rows for an item
    pub async fn count_annotations(&self, item_id: i64) -> Result<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM annotations WHERE item_id = ?")
            .bind(item_id)
            .fetch_one(self.pool)
            .await?;

        Ok(result.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::{parse_path, Anchor};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        OverlayRepository::new(&pool).init().await.unwrap();
        pool
    }

    fn anchor(path: &str, run: Option<u32>, offset: u32) -> Anchor {
        Anchor {
            structural_path: parse_path(path).unwrap(),
            text_run_index: run,
            char_offset: offset,
        }
    }

    fn note(id: Option<i64>, text: &str) -> AnnotationRecord {
        AnnotationRecord {
            id,
            anchor: anchor("/html[1]/body[1]/p[1]", Some(1), 4),
            x: 12.5,
            y: -3.0,
            cols: 30,
            rows: 5,
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_save_and_list_highlights() {
        let pool = setup_test_db().await;
        let repo = OverlayRepository::new(&pool);

        let records = vec![
            HighlightRecord {
                start: anchor("/html[1]/body[1]/p[1]", Some(1), 2),
                end: anchor("/html[1]/body[1]/p[1]", Some(2), 5),
            },
            HighlightRecord {
                start: anchor("/html[1]/body[1]/p[2]", None, 0),
                end: anchor("/html[1]/body[1]/span[not(@data-marginalia)][1]", Some(1), 9),
            },
        ];
        repo.save_item(1, &records, &[], &[]).await.unwrap();

        let rows = repo.list_highlights(1).await.unwrap();
        assert_eq!(rows.len(), 2);
        let (start, end) = rows[1].anchors().unwrap();
        assert_eq!(start, records[1].start);
        assert_eq!(end, records[1].end);
        assert!(repo.list_highlights(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_highlights_are_replaced_on_save() {
        let pool = setup_test_db().await;
        let repo = OverlayRepository::new(&pool);
        let record = HighlightRecord {
            start: anchor("/p[1]", Some(1), 0),
            end: anchor("/p[1]", Some(1), 4),
        };

        repo.save_item(1, &[record.clone(), record.clone()], &[], &[])
            .await
            .unwrap();
        repo.save_item(1, &[record], &[], &[]).await.unwrap();

        assert_eq!(repo.count_highlights(1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_annotation_upsert_and_delete() {
        let pool = setup_test_db().await;
        let repo = OverlayRepository::new(&pool);

        let ids = repo
            .save_item(1, &[], &[note(None, "first"), note(None, "second")], &[])
            .await
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);

        // Update the first, delete the second
        let ids = repo
            .save_item(1, &[], &[note(Some(ids[0]), "edited")], &[ids[1]])
            .await
            .unwrap();

        let rows = repo.list_annotations(1).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, ids[0]);
        assert_eq!(rows[0].text, "edited");
        assert_eq!(rows[0].x, 12.5);
        assert_eq!(rows[0].anchor().unwrap(), note(None, "").anchor);
    }

    #[tokio::test]
    async fn test_failed_save_leaves_previous_rows() {
        let pool = setup_test_db().await;
        let repo = OverlayRepository::new(&pool);
        let record = HighlightRecord {
            start: anchor("/p[1]", Some(1), 0),
            end: anchor("/p[1]", Some(1), 4),
        };
        repo.save_item(1, &[record.clone()], &[], &[]).await.unwrap();

        // Make the annotation step fail after the highlight rows were rewritten
        sqlx::query("DROP TABLE annotations")
            .execute(&pool)
            .await
            .unwrap();

        let result = repo
            .save_item(
                1,
                &[record.clone(), record.clone(), record],
                &[note(None, "lost")],
                &[],
            )
            .await;

        assert!(result.is_err());
        assert_eq!(repo.count_highlights(1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_file_backed_pool() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("overlays.db").display());

        let pool = super::super::create_pool(&url).await.unwrap();
        let repo = OverlayRepository::new(&pool);
        repo.save_item(5, &[], &[note(None, "persisted")], &[])
            .await
            .unwrap();
        pool.close().await;

        let pool = super::super::create_pool(&url).await.unwrap();
        let repo = OverlayRepository::new(&pool);
        assert_eq!(repo.count_annotations(5).await.unwrap(), 1);
    }
}
