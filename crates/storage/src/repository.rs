use async_trait::async_trait;
use chrono::{DateTime, Utc};
use guide_core::model::ProgressRecord;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::document::{decode, encode};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Durable key-value storage for the visitor's progress record.
///
/// One store instance belongs to one visitor; the key selects the record.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the stored record, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the stored payload is corrupt,
    /// or `StorageError::Connection` if the store cannot be read.
    async fn get_progress(&self, key: &str) -> Result<Option<ProgressRecord>, StorageError>;

    /// Persist or replace the record under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be encoded or written.
    async fn save_progress(
        &self,
        key: &str,
        record: &ProgressRecord,
        saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Remove the record under `key`. Removing a missing record is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the store cannot be written.
    async fn clear_progress(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Clone)]
struct StoredPayload {
    payload: String,
    saved_at: DateTime<Utc>,
}

/// Simple in-memory repository for tests and as a fallback when no durable
/// store is available. Records are kept as encoded payloads.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    progress: Arc<Mutex<HashMap<String, StoredPayload>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            progress: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Store a raw payload, bypassing encoding.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn put_raw(
        &self,
        key: &str,
        payload: impl Into<String>,
        saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(
            key.to_owned(),
            StoredPayload {
                payload: payload.into(),
                saved_at,
            },
        );
        Ok(())
    }

    /// Raw payload stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).map(|stored| stored.payload.clone()))
    }

    /// When the record under `key` was last written.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn saved_at(&self, key: &str) -> Result<Option<DateTime<Utc>>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).map(|stored| stored.saved_at))
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get_progress(&self, key: &str) -> Result<Option<ProgressRecord>, StorageError> {
        self.raw(key)?.map(|payload| decode(&payload)).transpose()
    }

    async fn save_progress(
        &self,
        key: &str,
        record: &ProgressRecord,
        saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let payload = encode(record)?;
        self.put_raw(key, payload, saved_at)
    }

    async fn clear_progress(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

/// Progress repository behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let progress: Arc<dyn ProgressRepository> = Arc::new(InMemoryRepository::new());
        Self { progress }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guide_core::model::{ChallengeIndex, SectionId};
    use guide_core::time::fixed_now;

    const KEY: &str = "guide.progress";

    #[tokio::test]
    async fn round_trips_progress() {
        let repo = InMemoryRepository::new();
        let mut record = ProgressRecord::new();
        record.activate(SectionId::Objects);
        record.complete_challenge(ChallengeIndex::new(1));

        repo.save_progress(KEY, &record, fixed_now()).await.unwrap();

        let fetched = repo.get_progress(KEY).await.unwrap();
        assert_eq!(fetched, Some(record));
        assert_eq!(repo.saved_at(KEY).unwrap(), Some(fixed_now()));
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let repo = InMemoryRepository::new();
        assert_eq!(repo.get_progress(KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_payload_is_serialization_error() {
        let repo = InMemoryRepository::new();
        repo.put_raw(KEY, "{oops", fixed_now()).unwrap();
        assert!(matches!(
            repo.get_progress(KEY).await,
            Err(StorageError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn clear_removes_record() {
        let repo = InMemoryRepository::new();
        repo.save_progress(KEY, &ProgressRecord::new(), fixed_now())
            .await
            .unwrap();
        repo.clear_progress(KEY).await.unwrap();
        repo.clear_progress(KEY).await.unwrap();
        assert_eq!(repo.get_progress(KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let repo = InMemoryRepository::new();
        let mut record = ProgressRecord::new();
        record.activate(SectionId::Quest);
        repo.save_progress("a", &record, fixed_now()).await.unwrap();
        assert_eq!(repo.get_progress("b").await.unwrap(), None);
    }
}
