//! Tests for the filesystem content store.

use mediavault_storage::{
    ContentHash, ContentStore, FileSystemStore, STAGING_DIR, StorageConfig, StorageErrorKind,
    StorageEvent, StorageObserver,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

fn open_store(temp_dir: &TempDir, max_bytes: u64) -> FileSystemStore {
    FileSystemStore::new(&StorageConfig::new(temp_dir.path(), max_bytes)).unwrap()
}

#[tokio::test]
async fn test_store_and_retrieve() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir, 1024);

    let data = b"Hello, world!";
    let mut reader: &[u8] = data;
    let stored = store.store(&mut reader).await.unwrap();

    assert_eq!(stored.content_hash, ContentHash::of_bytes(data));
    assert_eq!(stored.size_bytes, data.len() as u64);
    assert!(!stored.duplicate);
    assert!(stored.path.starts_with(store.base_path()));

    let retrieved = store.retrieve(&stored.content_hash).await.unwrap();
    assert_eq!(retrieved, data);
}

#[derive(Default)]
struct EventLog(Mutex<Vec<&'static str>>);

impl StorageObserver for EventLog {
    fn observe(&self, event: &StorageEvent<'_>) {
        let name = match event {
            StorageEvent::Staged { .. } => "staged",
            StorageEvent::Committed { .. } => "committed",
            StorageEvent::Duplicate { .. } => "duplicate",
            StorageEvent::CleanupFailed { .. } => "cleanup_failed",
            StorageEvent::Swept { .. } => "swept",
        };
        self.0.lock().unwrap().push(name);
    }
}

#[tokio::test]
async fn test_store_reports_each_stage_once() {
    let temp_dir = TempDir::new().unwrap();
    let log = Arc::new(EventLog::default());
    let store = open_store(&temp_dir, 1024).with_observer(log.clone());

    let mut first: &[u8] = b"observed content";
    let mut second: &[u8] = b"observed content";
    store.store(&mut first).await.unwrap();
    store.store(&mut second).await.unwrap();

    assert_eq!(
        *log.0.lock().unwrap(),
        vec!["staged", "committed", "staged", "duplicate"]
    );
}

#[tokio::test]
async fn test_deduplication() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir, 1024);

    let data = b"Duplicate content";
    let mut first: &[u8] = data;
    let mut second: &[u8] = data;
    let ref1 = store.store(&mut first).await.unwrap();
    let ref2 = store.store(&mut second).await.unwrap();

    assert_eq!(ref1.content_hash, ref2.content_hash);
    assert_eq!(ref1.path, ref2.path);
    assert!(!ref1.duplicate);
    assert!(ref2.duplicate);
}

#[tokio::test]
async fn test_upload_truncated_to_limit() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir, 5);

    let mut reader: &[u8] = b"0123456789";
    let stored = store.store(&mut reader).await.unwrap();

    assert_eq!(stored.size_bytes, 5);
    assert_eq!(stored.content_hash, ContentHash::of_bytes(b"01234"));
    assert_eq!(store.retrieve(&stored.content_hash).await.unwrap(), b"01234");
}

#[tokio::test]
async fn test_path_for_matches_stored_path() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir, 1024);

    let mut reader: &[u8] = b"where does this go";
    let stored = store.store(&mut reader).await.unwrap();

    assert_eq!(store.path_for(&stored.content_hash).unwrap(), stored.path);
}

#[tokio::test]
async fn test_exists_and_delete() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir, 1024);

    let mut reader: &[u8] = b"Delete me";
    let stored = store.store(&mut reader).await.unwrap();
    assert!(store.exists(&stored.content_hash).await.unwrap());

    store.delete(&stored.content_hash).await.unwrap();
    assert!(!store.exists(&stored.content_hash).await.unwrap());

    let err = store.delete(&stored.content_hash).await.unwrap_err();
    assert!(matches!(err.storage_kind(), Some(StorageErrorKind::NotFound(_))));
}

#[tokio::test]
async fn test_retrieve_missing() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir, 1024);

    let err = store
        .retrieve(&ContentHash::of_bytes(b"never stored"))
        .await
        .unwrap_err();
    assert!(matches!(err.storage_kind(), Some(StorageErrorKind::NotFound(_))));
}

#[tokio::test]
async fn test_retrieve_detects_corruption() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir, 1024);

    let mut reader: &[u8] = b"original bytes";
    let stored = store.store(&mut reader).await.unwrap();
    std::fs::write(&stored.path, b"tampered bytes").unwrap();

    let err = store.retrieve(&stored.content_hash).await.unwrap_err();
    assert!(matches!(err.storage_kind(), Some(StorageErrorKind::IntegrityMismatch(_))));
}

#[tokio::test]
async fn test_traversal_hash_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir, 1024);

    let hash = ContentHash::new("../../etc/passwd");
    let err = store.exists(&hash).await.unwrap_err();
    assert!(matches!(err.storage_kind(), Some(StorageErrorKind::PathEscape(_))));
}

#[tokio::test]
async fn test_collision_cleared_by_delete() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir, 1024);
    let data = b"rightful content";
    let hash = ContentHash::of_bytes(data);

    let squatter = store.path_for(&hash).unwrap();
    std::fs::create_dir_all(squatter.parent().unwrap()).unwrap();
    std::fs::write(&squatter, b"squatter").unwrap();

    let mut reader: &[u8] = data;
    let err = store.store(&mut reader).await.unwrap_err();
    assert!(matches!(
        err.storage_kind(),
        Some(StorageErrorKind::HashCollisionMismatch { .. })
    ));
    assert_eq!(std::fs::read(&squatter).unwrap(), b"squatter");

    store.delete(&hash).await.unwrap();
    let mut reader: &[u8] = data;
    let stored = store.store(&mut reader).await.unwrap();
    assert!(!stored.duplicate);
    assert_eq!(store.retrieve(&hash).await.unwrap(), data);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_identical_uploads() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir, 1024);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move {
                let mut reader: &[u8] = b"everyone uploads this";
                store.store(&mut reader).await
            })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap().unwrap());
    }

    let created = results.iter().filter(|r| !r.duplicate).count();
    assert_eq!(created, 1);
    assert!(results.iter().all(|r| r.path == results[0].path));
    assert_eq!(
        std::fs::read(&results[0].path).unwrap(),
        b"everyone uploads this"
    );

    let staging = std::fs::read_dir(temp_dir.path().join(STAGING_DIR)).unwrap();
    assert_eq!(staging.count(), 0);
}

#[tokio::test]
async fn test_sweep_removes_stale_staging() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir, 1024);

    let leftover = temp_dir.path().join(STAGING_DIR).join("upload-crashed");
    std::fs::create_dir_all(&leftover).unwrap();
    std::fs::write(leftover.join("content"), b"half an upload").unwrap();

    let removed = store.sweep_staging(Duration::from_secs(3600)).await.unwrap();
    assert_eq!(removed, 0);
    assert!(leftover.exists());

    let removed = store.sweep_staging(Duration::ZERO).await.unwrap();
    assert_eq!(removed, 1);
    assert!(!leftover.exists());
}

#[tokio::test]
async fn test_sweep_without_staging_dir() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir, 1024);

    assert_eq!(store.sweep_staging(Duration::ZERO).await.unwrap(), 0);
}

#[tokio::test]
async fn test_sweep_leaves_blobs_alone() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir, 1024);

    let mut reader: &[u8] = b"committed blob";
    let stored = store.store(&mut reader).await.unwrap();

    store.sweep_staging(Duration::ZERO).await.unwrap();
    assert!(stored.path.exists());
}

#[test]
fn test_invalid_config_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let err = FileSystemStore::new(&StorageConfig::new(temp_dir.path(), 0)).unwrap_err();
    assert!(err.storage_kind().is_none());
}
