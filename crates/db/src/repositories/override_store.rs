use chrono::Utc;
use sqlx::Row;

use quotedesk_core::errors::PortError;
use quotedesk_core::ports::{OverrideKey, OverridePort};

use super::RepositoryError;
use crate::DbPool;

/// `device_override` table: one row per [`OverrideKey`].
pub struct SqlOverrideRepository {
    pool: DbPool,
}

impl SqlOverrideRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, key: OverrideKey) -> Result<Option<String>, RepositoryError> {
        let row = sqlx::query("SELECT value FROM device_override WHERE key = ?")
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| row.try_get::<String, _>("value"))
            .transpose()
            .map_err(|e| RepositoryError::Decode(e.to_string()))
    }

    async fn upsert(&self, key: OverrideKey, value: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO device_override (key, value, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET
                 value = excluded.value,
                 updated_at = excluded.updated_at",
        )
        .bind(key.as_str())
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, key: OverrideKey) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM device_override WHERE key = ?")
            .bind(key.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl OverridePort for SqlOverrideRepository {
    async fn load(&self, key: OverrideKey) -> Result<Option<String>, PortError> {
        Ok(self.fetch(key).await?)
    }

    async fn save(&self, key: OverrideKey, value: &str) -> Result<(), PortError> {
        Ok(self.upsert(key, value).await?)
    }

    async fn clear(&self, key: OverrideKey) -> Result<(), PortError> {
        Ok(self.delete(key).await?)
    }
}
