//! Tests for the cache consistency protocol

mod common;

use common::{eventually, mtime, write_file};
use fileserve::cache::{CacheStore, FileStamp};
use std::sync::Arc;

fn stamp_of(path: &std::path::Path) -> FileStamp {
    FileStamp::from_metadata(&std::fs::metadata(path).unwrap())
}

#[tokio::test]
async fn test_first_fetch_loads_synchronously() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.html");
    write_file(&path, b"<h1>hi</h1>", mtime(0));

    let store = CacheStore::new();
    let body = store.fetch(&path, stamp_of(&path)).await;

    assert_eq!(&body[..], b"<h1>hi</h1>");
    assert_eq!(store.reload_count(), 1);

    let entry = store.get(&path).await.unwrap();
    assert_eq!(entry.last_modified, mtime(0));
}

#[tokio::test]
async fn test_fresh_entry_is_never_reread() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.css");
    write_file(&path, b"body {}", mtime(0));

    let store = CacheStore::new();
    for _ in 0..5 {
        let body = store.fetch(&path, stamp_of(&path)).await;
        assert_eq!(&body[..], b"body {}");
    }

    assert_eq!(store.reload_count(), 1);
}

#[tokio::test]
async fn test_stale_entry_serves_old_content_then_refreshes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.js");
    write_file(&path, b"v1", mtime(0));

    let store = CacheStore::new();
    store.fetch(&path, stamp_of(&path)).await;

    // The request that notices the new mtime does not wait for the reload
    write_file(&path, b"v2", mtime(10));
    let body = store.fetch(&path, stamp_of(&path)).await;
    assert_eq!(&body[..], b"v1");
    assert_eq!(store.reload_count(), 1);

    eventually(|| {
        let store = store.clone();
        let path = path.clone();
        async move {
            store
                .get(&path)
                .await
                .is_some_and(|entry| entry.last_modified == mtime(10))
        }
    })
    .await;

    let body = store.fetch(&path, stamp_of(&path)).await;
    assert_eq!(&body[..], b"v2");
    assert_eq!(store.reload_count(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_fetches_share_one_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.jpg");
    let content: Vec<u8> = (0..256 * 1024).map(|i| (i % 251) as u8).collect();
    write_file(&path, &content, mtime(0));

    let store = CacheStore::new();
    let stamp = stamp_of(&path);
    let content = Arc::new(content);

    let mut tasks = Vec::new();
    for _ in 0..32 {
        let store = store.clone();
        let path = path.clone();
        let content = Arc::clone(&content);
        tasks.push(tokio::spawn(async move {
            let body = store.fetch(&path, stamp).await;
            assert_eq!(&body[..], &content[..]);
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(store.reload_count(), 1);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_reload_of_unknown_path_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("never-served.txt");
    write_file(&path, b"x", mtime(0));

    let store = CacheStore::new();

    assert!(!store.reload(&path, stamp_of(&path)).await);
    assert!(store.is_empty().await);
    assert_eq!(store.reload_count(), 0);
}

#[tokio::test]
async fn test_explicit_reload_picks_up_new_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    write_file(&path, b"old", mtime(0));

    let store = CacheStore::new();
    store.fetch(&path, stamp_of(&path)).await;

    write_file(&path, b"new and longer", mtime(5));
    assert!(store.reload(&path, stamp_of(&path)).await);

    let entry = store.get(&path).await.unwrap();
    assert_eq!(&entry.content[..], b"new and longer");
    assert_eq!(entry.last_modified, mtime(5));
}

#[tokio::test]
async fn test_failed_reload_keeps_previous_entry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flaky.txt");
    write_file(&path, b"cached", mtime(0));

    let store = CacheStore::new();
    store.fetch(&path, stamp_of(&path)).await;

    std::fs::remove_file(&path).unwrap();
    assert!(store.reload(&path, FileStamp::new(6, mtime(7))).await);

    let entry = store.get(&path).await.unwrap();
    assert_eq!(&entry.content[..], b"cached");
    assert_eq!(entry.last_modified, mtime(0));
}

#[tokio::test]
async fn test_remove_drops_entry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gone.html");
    write_file(&path, b"bye", mtime(0));

    let store = CacheStore::new();
    store.fetch(&path, stamp_of(&path)).await;
    assert!(store.contains(&path).await);

    assert!(store.remove(&path).await);
    assert!(!store.contains(&path).await);
    assert!(!store.remove(&path).await);
}

#[tokio::test]
async fn test_spawned_remove_completes_in_background() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("later.html");
    write_file(&path, b"x", mtime(0));

    let store = CacheStore::new();
    store.fetch(&path, stamp_of(&path)).await;
    store.spawn_remove(path.clone());

    eventually(|| {
        let store = store.clone();
        let path = path.clone();
        async move { !store.contains(&path).await }
    })
    .await;
}

#[tokio::test]
async fn test_entries_lists_loaded_paths() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.html");
    let b = dir.path().join("b.html");
    write_file(&a, b"a", mtime(1));
    write_file(&b, b"b", mtime(2));

    let store = CacheStore::new();
    store.fetch(&a, stamp_of(&a)).await;
    store.fetch(&b, stamp_of(&b)).await;

    let mut entries = store.entries().await;
    entries.sort();

    assert_eq!(entries, vec![(a, mtime(1)), (b, mtime(2))]);
}
