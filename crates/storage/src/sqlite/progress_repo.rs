use async_trait::async_trait;
use chrono::{DateTime, Utc};
use guide_core::model::ProgressRecord;
use sqlx::Row;

use crate::document::{decode, encode};
use crate::repository::{ProgressRepository, StorageError};

use super::SqliteRepository;

impl SqliteRepository {
    /// Timestamp of the last write under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails or the column cannot be decoded.
    pub async fn progress_updated_at(
        &self,
        key: &str,
    ) -> Result<Option<DateTime<Utc>>, StorageError> {
        let row = sqlx::query("SELECT updated_at FROM progress_records WHERE storage_key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        row.map(|row| {
            row.try_get::<DateTime<Utc>, _>("updated_at")
                .map_err(|err| StorageError::Serialization(err.to_string()))
        })
        .transpose()
    }

    /// Overwrite the raw payload under `key` without encoding.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the write fails.
    pub async fn put_raw_progress(
        &self,
        key: &str,
        payload: &str,
        saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO progress_records (storage_key, payload, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(storage_key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            ",
        )
        .bind(key)
        .bind(payload)
        .bind(saved_at)
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn get_progress(&self, key: &str) -> Result<Option<ProgressRecord>, StorageError> {
        let row = sqlx::query("SELECT payload FROM progress_records WHERE storage_key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let payload: String = row
            .try_get("payload")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;

        decode(&payload).map(Some)
    }

    async fn save_progress(
        &self,
        key: &str,
        record: &ProgressRecord,
        saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let payload = encode(record)?;
        self.put_raw_progress(key, &payload, saved_at).await?;
        tracing::debug!(key, bytes = payload.len(), "progress written");
        Ok(())
    }

    async fn clear_progress(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM progress_records WHERE storage_key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }
}
