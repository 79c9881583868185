use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use guide_core::model::{ChallengeIndex, ProgressRecord, SectionId};
use guide_core::resolver::SectionCandidate;
use guide_core::time::fixed_clock;
use guide_core::{GuideConfig, GuideConfigDraft, SectionLayout};
use services::{
    ChannelAdapter, GuideError, GuideServices, GuideSession, Notification, NullAdapter,
    ProgressService,
};
use storage::repository::{ProgressRepository, Storage, StorageError};

struct BrokenStore;

#[async_trait]
impl ProgressRepository for BrokenStore {
    async fn get_progress(&self, _key: &str) -> Result<Option<ProgressRecord>, StorageError> {
        Err(StorageError::Connection("disk unplugged".into()))
    }

    async fn save_progress(
        &self,
        _key: &str,
        _record: &ProgressRecord,
        _saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        Err(StorageError::Connection("disk unplugged".into()))
    }

    async fn clear_progress(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Connection("disk unplugged".into()))
    }
}

fn jungle_layout() -> SectionLayout {
    SectionLayout::new([
        SectionCandidate::new(SectionId::Welcome, 0.0, 800.0),
        SectionCandidate::new(SectionId::Classes, 800.0, 800.0),
        SectionCandidate::new(SectionId::Objects, 1600.0, 800.0),
    ])
}

#[tokio::test]
async fn scroll_scenario_walks_down_the_page() {
    let services = GuideServices::in_memory(fixed_clock(), GuideConfig::default());
    let (adapter, mut rx) = ChannelAdapter::channel();
    let mut session = services.start_session(Arc::new(adapter)).await;
    session.set_layout(jungle_layout());

    assert_eq!(session.on_scroll(0.0).await, Some(SectionId::Welcome));
    assert_eq!(session.on_scroll(100.0).await, Some(SectionId::Welcome));
    assert_eq!(session.on_scroll(850.0).await, Some(SectionId::Classes));
    assert_eq!(session.on_scroll(1450.0).await, Some(SectionId::Objects));

    let mut seen = Vec::new();
    while let Ok(n) = rx.try_recv() {
        seen.push(n);
    }
    assert_eq!(
        seen,
        vec![
            Notification::ActiveSectionChanged(SectionId::Welcome),
            Notification::ActiveSectionChanged(SectionId::Classes),
            Notification::ActiveSectionChanged(SectionId::Objects),
        ]
    );

    let snapshot = session.snapshot();
    assert_eq!(snapshot.active_section(), Some(SectionId::Objects));
    assert_eq!(snapshot.visited_count(), 3);
    assert_eq!(snapshot.total_sections(), 12);
}

#[tokio::test]
async fn scrolling_back_up_keeps_visited_flags() {
    let services = GuideServices::in_memory(fixed_clock(), GuideConfig::default());
    let mut session = services.start_session(Arc::new(NullAdapter)).await;
    session.set_layout(SectionLayout::uniform(500.0));

    session.on_scroll(5400.0).await;
    session.on_scroll(0.0).await;

    let record = session.record();
    assert_eq!(record.active_section(), Some(SectionId::Welcome));
    assert!(record.is_visited(SectionId::Quest));
    assert_eq!(record.visited_count(), 2);
}

#[tokio::test]
async fn custom_margin_changes_activation_point() {
    let config = GuideConfigDraft {
        activation_margin: Some(0.0),
        ..GuideConfigDraft::default()
    }
    .validate()
    .unwrap();
    let services = GuideServices::in_memory(fixed_clock(), config);
    let mut session = services.start_session(Arc::new(NullAdapter)).await;
    session.set_layout(jungle_layout());

    assert_eq!(session.on_scroll(700.0).await, Some(SectionId::Welcome));
    assert_eq!(session.on_scroll(800.0).await, Some(SectionId::Classes));
}

#[tokio::test]
async fn quest_completion_scenario() {
    let services = GuideServices::in_memory(fixed_clock(), GuideConfig::default());
    let (adapter, mut rx) = ChannelAdapter::channel();
    let mut session = services.start_session(Arc::new(adapter)).await;

    for idx in [0, 1, 2] {
        session.on_challenge_toggled(idx, true).await.unwrap();
    }
    let status = session.on_challenge_toggled(2, true).await.unwrap();
    assert_eq!(status.completed_count, 3);
    assert!(!status.unlocked);
    assert!(matches!(session.claim_reward(), Err(GuideError::RewardLocked(_))));

    let status = session.on_challenge_toggled(3, true).await.unwrap();
    assert_eq!(status.completed_count, 4);
    assert!(status.unlocked);
    assert_eq!(status.remaining(), 0);

    let mut statuses = Vec::new();
    while let Ok(Notification::CompletionStatusChanged(s)) = rx.try_recv() {
        statuses.push(s.completed_count);
    }
    assert_eq!(statuses, vec![1, 2, 3, 4]);
    assert!(session.claim_reward().is_ok());
}

#[tokio::test]
async fn progress_survives_a_new_session() {
    let storage = Storage::in_memory();
    let config = GuideConfig::default();
    let services = GuideServices::from_storage(storage.clone(), fixed_clock(), config.clone(), true);

    let mut session = services.start_session(Arc::new(NullAdapter)).await;
    session.on_section_link_activated("encapsulation").await.unwrap();
    session.mark_complete(ChallengeIndex::new(1)).await;
    session.set_visitor_label(Some("Explorer".into())).await;
    let before = session.into_record();

    let restarted = GuideServices::from_storage(storage, fixed_clock(), config, true);
    let session = restarted.start_session(Arc::new(NullAdapter)).await;
    assert_eq!(session.record(), &before);
    assert_eq!(session.completion_status().completed_count, 1);
}

#[tokio::test]
async fn broken_store_degrades_to_unremembered_progress() {
    let progress = ProgressService::new(fixed_clock(), "guide.progress", Arc::new(BrokenStore));
    let mut session = GuideSession::start(
        &GuideConfig::default(),
        progress.clone(),
        Arc::new(NullAdapter),
    )
    .await;

    assert_eq!(session.record(), &ProgressRecord::new());
    assert!(session.jump_to(SectionId::Exceptions).await);
    let status = session.on_challenge_toggled(0, true).await.unwrap();

    assert_eq!(status.completed_count, 1);
    assert_eq!(session.record().active_section(), Some(SectionId::Exceptions));
    assert_eq!(progress.failed_writes(), 2);
    assert!(progress.reset().await.is_err());
}

#[tokio::test]
async fn sqlite_store_remembers_progress() {
    let url = "sqlite:file:memdb_guide_flow?mode=memory&cache=shared";
    let first = GuideServices::new_sqlite(url, fixed_clock(), GuideConfig::default()).await;
    assert!(first.is_durable());

    let mut session = first.start_session(Arc::new(NullAdapter)).await;
    session.on_section_link_activated("quest").await.unwrap();
    for idx in 0..4 {
        session.on_challenge_toggled(idx, true).await.unwrap();
    }
    assert_eq!(first.progress().failed_writes(), 0);

    let second = GuideServices::new_sqlite(url, fixed_clock(), GuideConfig::default()).await;
    let restored = second.start_session(Arc::new(NullAdapter)).await;
    assert_eq!(restored.record(), session.record());
    assert!(restored.completion_status().unlocked);
    assert!(restored.claim_reward().is_ok());
}
