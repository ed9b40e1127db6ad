//! Highlights database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::{AppError, Result};
use crate::highlights::{
    HighlightColor, HighlightId, HighlightPersistence, HighlightRecord, NewHighlight,
    PersistError,
};

/// Highlight repository
pub struct HighlightRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> HighlightRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a specific highlight
    pub async fn get(&self, id: &HighlightId) -> Result<Option<HighlightRecord>> {
        let row = sqlx::query_as::<_, HighlightRow>(
            r#"
            SELECT id, document_id, start_offset, end_offset,
                   highlighted_text, highlight_color, created_at
            FROM highlights
            WHERE id = ?
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(HighlightRow::into_record).transpose()
    }

    /// List highlights for a document in offset order
    pub async fn list_for_document(&self, document_id: &str) -> Result<Vec<HighlightRecord>> {
        let rows = sqlx::query_as::<_, HighlightRow>(
            r#"
            SELECT id, document_id, start_offset, end_offset,
                   highlighted_text, highlight_color, created_at
            FROM highlights
            WHERE document_id = ?
            ORDER BY start_offset ASC, end_offset ASC, id ASC
            "#,
        )
        .bind(document_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(HighlightRow::into_record).collect()
    }

    /// List every highlight, newest first
    pub async fn list_all(&self) -> Result<Vec<HighlightRecord>> {
        let rows = sqlx::query_as::<_, HighlightRow>(
            r#"
            SELECT id, document_id, start_offset, end_offset,
                   highlighted_text, highlight_color, created_at
            FROM highlights
            ORDER BY created_at DESC, id ASC
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(HighlightRow::into_record).collect()
    }

    /// Create a new highlight with a fresh id
    pub async fn create(&self, data: &NewHighlight) -> Result<HighlightRecord> {
        let record = HighlightRecord::from_new(HighlightId::generate(), data)?;

        sqlx::query(
            r#"
            INSERT INTO highlights (id, document_id, start_offset, end_offset, highlighted_text, highlight_color, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.as_str())
        .bind(&record.document_id)
        .bind(record.start as i64)
        .bind(record.end as i64)
        .bind(&record.display_text)
        .bind(record.color.as_str())
        .bind(record.created_at.to_rfc3339())
        .execute(self.pool)
        .await?;

        tracing::debug!(
            "Created highlight {} on {} [{}, {})",
            record.id,
            record.document_id,
            record.start,
            record.end
        );

        Ok(record)
    }

    /// Delete a highlight
    pub async fn delete(&self, id: &HighlightId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM highlights WHERE id = ?")
            .bind(id.as_str())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete all highlights for a document
    pub async fn delete_for_document(&self, document_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM highlights WHERE document_id = ?")
            .bind(document_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Count highlights for a document
    pub async fn count_for_document(&self, document_id: &str) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM highlights WHERE document_id = ?")
            .bind(document_id)
            .fetch_one(self.pool)
            .await?;

        Ok(row.0)
    }
}

#[async_trait]
impl<'a> HighlightPersistence for HighlightRepository<'a> {
    async fn create_highlight(&self, new: &NewHighlight) -> std::result::Result<HighlightRecord, PersistError> {
        Ok(self.create(new).await?)
    }

    async fn delete_highlight(&self, id: &HighlightId) -> std::result::Result<bool, PersistError> {
        Ok(self.delete(id).await?)
    }

    async fn list_highlights(
        &self,
        document_id: &str,
    ) -> std::result::Result<Vec<HighlightRecord>, PersistError> {
        Ok(self.list_for_document(document_id).await?)
    }
}

/// Internal row type for SQLite queries
#[derive(sqlx::FromRow)]
struct HighlightRow {
    id: String,
    document_id: String,
    start_offset: i64,
    end_offset: i64,
    highlighted_text: String,
    highlight_color: String,
    created_at: String,
}

impl HighlightRow {
    /// Offsets are taken as stored; ranges that no longer fit the text are
    /// the renderer's to report
    fn into_record(self) -> Result<HighlightRecord> {
        let offset = |value: i64| {
            usize::try_from(value).map_err(|_| {
                AppError::Internal(format!("Highlight {} has negative offset {}", self.id, value))
            })
        };
        let start = offset(self.start_offset)?;
        let end = offset(self.end_offset)?;

        let color: HighlightColor = self.highlight_color.parse()?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| AppError::Internal(format!("Bad timestamp on {}: {}", self.id, e)))?
            .with_timezone(&Utc);

        Ok(HighlightRecord {
            id: HighlightId::new(self.id),
            document_id: self.document_id,
            start,
            end,
            color,
            display_text: self.highlighted_text,
            created_at,
        })
    }
}
