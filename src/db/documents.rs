//! Document text storage
//!
//! Highlights are anchored to a document's raw text by offset, so replacing
//! that text invalidates every highlight on it.

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::Result;

/// Stored document
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Document {
    pub id: String,
    pub title: Option<String>,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Document {
    /// Length of the content in characters
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Outcome of storing a document's text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DocumentUpsert {
    pub created: bool,
    /// Highlights deleted because the text changed under them
    pub invalidated_highlights: u64,
}

/// Document repository
pub struct DocumentRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> DocumentRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a document by ID
    pub async fn get(&self, id: &str) -> Result<Option<Document>> {
        let document = sqlx::query_as::<_, Document>(
            r#"
            SELECT id, title, content, created_at, updated_at
            FROM documents
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(document)
    }

    /// Insert or replace a document's text
    ///
    /// When the text differs from what is stored, the document's highlights
    /// are deleted in the same transaction. A `None` title keeps the old one.
    pub async fn upsert(&self, id: &str, title: Option<&str>, content: &str) -> Result<DocumentUpsert> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<(String,)> =
            sqlx::query_as("SELECT content FROM documents WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let changed = existing
            .as_ref()
            .is_some_and(|(old,)| old.as_str() != content);

        let invalidated_highlights = if changed {
            sqlx::query("DELETE FROM highlights WHERE document_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected()
        } else {
            0
        };

        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO documents (id, title, content, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = COALESCE(excluded.title, documents.title),
                content = excluded.content,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(content)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if invalidated_highlights > 0 {
            tracing::info!(
                "Document {} text replaced; removed {} highlights",
                id,
                invalidated_highlights
            );
        }

        Ok(DocumentUpsert {
            created: existing.is_none(),
            invalidated_highlights,
        })
    }
}
