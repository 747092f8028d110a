use chrono::Utc;
use sqlx::Row;

use quotedesk_core::domain::document::Document;
use quotedesk_core::errors::PortError;
use quotedesk_core::ports::DocumentPort;

use super::RepositoryError;
use crate::DbPool;

/// `memo_document` table. Rows come back in the order they were written.
pub struct SqlDocumentRepository {
    pool: DbPool,
}

impl SqlDocumentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn fetch_all(&self) -> Result<Vec<Document>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT name, data_uri, mime_type
             FROM memo_document
             ORDER BY position ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_document).collect::<Result<Vec<_>, _>>()
    }

    /// Clear-then-write inside one transaction. A name written twice keeps its
    /// first position and its last content.
    async fn write_all(&self, documents: &[Document]) -> Result<(), RepositoryError> {
        let stored_at = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM memo_document").execute(&mut *tx).await?;
        for (position, document) in
            documents.iter().filter(|document| !document.is_system).enumerate()
        {
            sqlx::query(
                "INSERT INTO memo_document (name, position, data_uri, mime_type, stored_at)
                 VALUES (?, ?, ?, ?, ?)
                 ON CONFLICT(name) DO UPDATE SET
                     data_uri = excluded.data_uri,
                     mime_type = excluded.mime_type,
                     stored_at = excluded.stored_at",
            )
            .bind(&document.name)
            .bind(position as i64)
            .bind(&document.base64)
            .bind(&document.mime_type)
            .bind(&stored_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

fn row_to_document(row: &sqlx::sqlite::SqliteRow) -> Result<Document, RepositoryError> {
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let base64: String =
        row.try_get("data_uri").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let mime_type: String =
        row.try_get("mime_type").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Document { name, base64, mime_type, is_system: false })
}

#[async_trait::async_trait]
impl DocumentPort for SqlDocumentRepository {
    async fn load_all(&self) -> Result<Vec<Document>, PortError> {
        Ok(self.fetch_all().await?)
    }

    async fn replace_all(&self, documents: &[Document]) -> Result<(), PortError> {
        Ok(self.write_all(documents).await?)
    }
}
