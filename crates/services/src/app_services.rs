use std::sync::Arc;

use guide_core::GuideConfig;
use storage::repository::Storage;
use tokio::task::JoinHandle;

use crate::Clock;
use crate::event_loop::{self, DEFAULT_QUEUE_CAPACITY, GuideHandle};
use crate::notify::PresentationAdapter;
use crate::progress_service::ProgressService;
use crate::session::GuideSession;

/// Assembles the progress store and configuration into ready-to-run sessions.
#[derive(Clone)]
pub struct GuideServices {
    config: GuideConfig,
    progress: ProgressService,
    durable: bool,
}

impl GuideServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// If the database cannot be opened or migrated the failure is logged and
    /// the services fall back to in-memory storage, so progress is simply not
    /// remembered across runs.
    pub async fn new_sqlite(db_url: &str, clock: Clock, config: GuideConfig) -> Self {
        match Storage::sqlite(db_url).await {
            Ok(storage) => Self::from_storage(storage, clock, config, true),
            Err(err) => {
                tracing::warn!(
                    db_url,
                    error = %err,
                    "progress database unavailable, progress will not be remembered"
                );
                Self::in_memory(clock, config)
            }
        }
    }

    /// Build services backed by in-memory storage.
    #[must_use]
    pub fn in_memory(clock: Clock, config: GuideConfig) -> Self {
        Self::from_storage(Storage::in_memory(), clock, config, false)
    }

    #[must_use]
    pub fn from_storage(storage: Storage, clock: Clock, config: GuideConfig, durable: bool) -> Self {
        let progress = ProgressService::new(
            clock,
            config.storage_key(),
            Arc::clone(&storage.progress),
        );
        Self {
            config,
            progress,
            durable,
        }
    }

    #[must_use]
    pub fn config(&self) -> &GuideConfig {
        &self.config
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressService {
        &self.progress
    }

    /// Whether progress survives a restart.
    #[must_use]
    pub fn is_durable(&self) -> bool {
        self.durable
    }

    /// Load the stored record and start a session owned by the caller.
    pub async fn start_session(&self, adapter: Arc<dyn PresentationAdapter>) -> GuideSession {
        GuideSession::start(&self.config, self.progress.clone(), adapter).await
    }

    /// Start a session on its own task behind the event queue.
    pub async fn spawn_session(
        &self,
        adapter: Arc<dyn PresentationAdapter>,
    ) -> (GuideHandle, JoinHandle<GuideSession>) {
        let session = self.start_session(adapter).await;
        event_loop::spawn(session, DEFAULT_QUEUE_CAPACITY)
    }
}
