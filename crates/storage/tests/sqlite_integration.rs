use chrono::Duration;
use guide_core::model::{ChallengeIndex, ProgressRecord, SectionId};
use guide_core::time::fixed_now;
use storage::repository::{ProgressRepository, Storage, StorageError};
use storage::sqlite::SqliteRepository;

const KEY: &str = "guide.progress";

fn visited_record() -> ProgressRecord {
    let mut record = ProgressRecord::new();
    record.set_visitor_label(Some("Explorer".into()));
    record.activate(SectionId::Welcome);
    record.activate(SectionId::Inheritance);
    record.complete_challenge(ChallengeIndex::new(0));
    record.complete_challenge(ChallengeIndex::new(3));
    record
}

#[tokio::test]
async fn sqlite_roundtrip_persists_progress() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let record = visited_record();
    repo.save_progress(KEY, &record, fixed_now()).await.unwrap();

    let fetched = repo.get_progress(KEY).await.expect("fetch");
    assert_eq!(fetched, Some(record));
    assert_eq!(
        repo.progress_updated_at(KEY).await.unwrap(),
        Some(fixed_now())
    );
}

#[tokio::test]
async fn sqlite_save_overwrites_previous_record() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress_overwrite?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let mut record = ProgressRecord::new();
    record.activate(SectionId::Classes);
    repo.save_progress(KEY, &record, fixed_now()).await.unwrap();

    record.activate(SectionId::Methods);
    let later = fixed_now() + Duration::minutes(3);
    repo.save_progress(KEY, &record, later).await.unwrap();

    let fetched = repo.get_progress(KEY).await.unwrap().expect("record");
    assert_eq!(fetched.active_section(), Some(SectionId::Methods));
    assert!(fetched.is_visited(SectionId::Classes));
    assert_eq!(repo.progress_updated_at(KEY).await.unwrap(), Some(later));
}

#[tokio::test]
async fn sqlite_missing_and_cleared_records_are_none() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress_clear?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    assert_eq!(repo.get_progress(KEY).await.unwrap(), None);

    repo.save_progress(KEY, &visited_record(), fixed_now())
        .await
        .unwrap();
    repo.clear_progress(KEY).await.unwrap();
    assert_eq!(repo.get_progress(KEY).await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_corrupt_payload_surfaces_serialization_error() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress_corrupt?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.put_raw_progress(KEY, "not json at all", fixed_now())
        .await
        .unwrap();
    assert!(matches!(
        repo.get_progress(KEY).await,
        Err(StorageError::Serialization(_))
    ));
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.migrate().await.expect("second migrate");
}

#[tokio::test]
async fn storage_sqlite_wires_progress_repository() {
    let storage = Storage::sqlite("sqlite:file:memdb_progress_storage?mode=memory&cache=shared")
        .await
        .expect("storage");
    let record = visited_record();
    storage
        .progress
        .save_progress(KEY, &record, fixed_now())
        .await
        .unwrap();
    assert_eq!(storage.progress.get_progress(KEY).await.unwrap(), Some(record));
}
