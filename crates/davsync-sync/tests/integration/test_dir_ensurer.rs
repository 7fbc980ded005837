//! Remote directory creation and caching

use davsync_core::ports::TransportError;
use davsync_sync::{dir_ensurer::RemoteDirEnsurer, SyncError};

use crate::common::{remote, server_error, Call, MemoryStorage, Op};

#[tokio::test]
async fn test_creates_missing_ancestors_parent_first() {
    let storage = MemoryStorage::new();
    let ensurer = RemoteDirEnsurer::new(storage.clone());

    ensurer.ensure(&remote("/backup/a/b/c.txt")).await.unwrap();

    assert_eq!(
        storage.calls(),
        vec![
            Call::new(Op::Exists, "/backup"),
            Call::new(Op::Mkdir, "/backup"),
            Call::new(Op::Exists, "/backup/a"),
            Call::new(Op::Mkdir, "/backup/a"),
            Call::new(Op::Exists, "/backup/a/b"),
            Call::new(Op::Mkdir, "/backup/a/b"),
        ]
    );
    assert!(storage.has_dir("/backup/a/b"));
    assert_eq!(ensurer.cached_count(), 3);
}

#[tokio::test]
async fn test_cached_ancestors_are_not_checked_again() {
    let storage = MemoryStorage::new();
    let ensurer = RemoteDirEnsurer::new(storage.clone());

    ensurer.ensure(&remote("/backup/a/b/c.txt")).await.unwrap();
    storage.clear_calls();

    ensurer.ensure(&remote("/backup/a/b/d.txt")).await.unwrap();
    assert!(storage.calls().is_empty());

    // Only the new leaf directory is visited
    ensurer.ensure(&remote("/backup/a/b/e/f.txt")).await.unwrap();
    assert_eq!(
        storage.calls(),
        vec![
            Call::new(Op::Exists, "/backup/a/b/e"),
            Call::new(Op::Mkdir, "/backup/a/b/e"),
        ]
    );
}

#[tokio::test]
async fn test_existing_directories_are_not_created() {
    let storage = MemoryStorage::new();
    storage.add_dir("/backup");
    storage.add_dir("/backup/a");
    let ensurer = RemoteDirEnsurer::new(storage.clone());

    ensurer.ensure(&remote("/backup/a/c.txt")).await.unwrap();

    assert!(storage.calls_of(Op::Mkdir).is_empty());
    assert_eq!(storage.calls_of(Op::Exists), vec!["/backup", "/backup/a"]);
    assert!(ensurer.is_cached(&remote("/backup/a")));
}

#[tokio::test]
async fn test_file_at_remote_root_needs_no_directories() {
    let storage = MemoryStorage::new();
    let ensurer = RemoteDirEnsurer::new(storage.clone());

    ensurer.ensure(&remote("/top.txt")).await.unwrap();
    assert!(storage.calls().is_empty());
}

#[tokio::test]
async fn test_failure_names_the_ancestor_and_stops() {
    let storage = MemoryStorage::new();
    storage.fail_always(
        Op::Mkdir,
        "/backup/a",
        TransportError::Forbidden("MKCOL /backup/a".into()),
    );
    let ensurer = RemoteDirEnsurer::new(storage.clone());

    let err = ensurer.ensure(&remote("/backup/a/b/c.txt")).await.unwrap_err();

    match &err {
        SyncError::RemoteDir { path, cause } => {
            assert_eq!(path.as_str(), "/backup/a");
            assert!(matches!(cause, TransportError::Forbidden(_)));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!err.is_transient());
    assert!(storage.calls_of(Op::Exists).iter().all(|p| p != "/backup/a/b"));
    assert!(ensurer.is_cached(&remote("/backup")));
    assert!(!ensurer.is_cached(&remote("/backup/a")));
}

#[tokio::test]
async fn test_transient_check_failure_is_transient() {
    let storage = MemoryStorage::new();
    storage.fail(Op::Exists, "/backup", server_error(), 1);
    let ensurer = RemoteDirEnsurer::new(storage.clone());

    let err = ensurer.ensure(&remote("/backup/c.txt")).await.unwrap_err();
    assert!(err.is_transient());
    assert_eq!(ensurer.cached_count(), 0);

    // The next call succeeds once the fault is spent
    ensurer.ensure(&remote("/backup/c.txt")).await.unwrap();
    assert!(storage.has_dir("/backup"));
}

#[tokio::test]
async fn test_invalidation_forces_recheck() {
    let storage = MemoryStorage::new();
    let ensurer = RemoteDirEnsurer::new(storage.clone());

    ensurer.ensure(&remote("/backup/a/c.txt")).await.unwrap();

    // Someone removed the directory remotely
    storage.remove_dir("/backup/a");
    ensurer.invalidate_ancestors(&remote("/backup/a/c.txt"));
    assert_eq!(ensurer.cached_count(), 0);
    storage.clear_calls();

    ensurer.ensure(&remote("/backup/a/c.txt")).await.unwrap();
    assert_eq!(
        storage.calls(),
        vec![
            Call::new(Op::Exists, "/backup"),
            Call::new(Op::Exists, "/backup/a"),
            Call::new(Op::Mkdir, "/backup/a"),
        ]
    );
}
