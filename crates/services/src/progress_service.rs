use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use guide_core::Clock;
use guide_core::model::ProgressRecord;
use storage::repository::{ProgressRepository, StorageError};

/// Load/save policy around the progress store.
///
/// Loading never fails and saving never surfaces an error to the caller:
/// an unreadable store degrades to a fresh record and a failed write is
/// logged, counted, and dropped.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    key: String,
    repo: Arc<dyn ProgressRepository>,
    failed_writes: Arc<AtomicU64>,
}

impl ProgressService {
    #[must_use]
    pub fn new(clock: Clock, key: impl Into<String>, repo: Arc<dyn ProgressRepository>) -> Self {
        Self {
            clock,
            key: key.into(),
            repo,
            failed_writes: Arc::new(AtomicU64::new(0)),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the stored record, or a fresh one if nothing usable is stored.
    pub async fn load(&self) -> ProgressRecord {
        match self.repo.get_progress(&self.key).await {
            Ok(Some(record)) => {
                tracing::debug!(
                    key = %self.key,
                    visited = record.visited_count(),
                    "restored progress"
                );
                record
            }
            Ok(None) => ProgressRecord::new(),
            Err(err @ StorageError::Serialization(_)) => {
                tracing::warn!(key = %self.key, error = %err, "stored progress is unreadable, starting fresh");
                ProgressRecord::new()
            }
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "progress store unavailable, starting fresh");
                ProgressRecord::new()
            }
        }
    }

    /// Write the record through to the store.
    ///
    /// Returns whether the write succeeded; failures are already logged.
    pub async fn save(&self, record: &ProgressRecord) -> bool {
        match self.try_save(record).await {
            Ok(()) => true,
            Err(err) => {
                let failed = self.failed_writes.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::warn!(key = %self.key, error = %err, failed, "dropping progress write");
                false
            }
        }
    }

    /// Write the record, surfacing the storage error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be encoded or written.
    pub async fn try_save(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        self.repo
            .save_progress(&self.key, record, self.clock.now())
            .await
    }

    /// Forget the stored record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be written.
    pub async fn reset(&self) -> Result<(), StorageError> {
        self.repo.clear_progress(&self.key).await?;
        tracing::info!(key = %self.key, "progress cleared");
        Ok(())
    }

    /// Number of writes dropped since this service was created.
    #[must_use]
    pub fn failed_writes(&self) -> u64 {
        self.failed_writes.load(Ordering::Relaxed)
    }
}
