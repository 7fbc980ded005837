//! End-to-end mirroring of a local tree onto `/backup`

use std::time::Duration;

use davsync_core::domain::event::{EventKind, IntentKind, RawEvent};
use davsync_sync::{scheduler::SyncScheduler, watcher::FileWatcher, watcher::WatchEvent};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::common::{Fixture, Op};

#[tokio::test(start_paused = true)]
async fn test_create_then_delete_is_mirrored() {
    let fx = Fixture::new();
    let (tx, rx) = mpsc::channel(64);
    let shutdown = CancellationToken::new();
    let scheduler = SyncScheduler::new(
        rx,
        Duration::from_millis(500),
        fx.orchestrator.clone(),
        shutdown.clone(),
    );
    let handle = tokio::spawn(scheduler.run());

    // The watcher reports the new directory and the file inside it
    let notes = fx.local("notes");
    std::fs::create_dir_all(&notes).unwrap();
    tx.send(WatchEvent::Change(RawEvent::directory(EventKind::Created, &notes)))
        .await
        .unwrap();
    let todo = fx.write("notes/todo.txt", b"buy milk");
    tx.send(WatchEvent::Change(RawEvent::file(EventKind::Created, &todo)))
        .await
        .unwrap();
    tx.send(WatchEvent::Change(RawEvent::file(EventKind::Modified, &todo)))
        .await
        .unwrap();

    let outcomes = fx.reporter.wait_for(1).await;
    assert!(outcomes[0].success);
    assert_eq!(outcomes[0].kind, IntentKind::Upload);
    assert_eq!(outcomes[0].local_path, todo);
    assert_eq!(outcomes[0].remote_path.as_str(), "/backup/notes/todo.txt");
    assert_eq!(
        fx.storage.file("/backup/notes/todo.txt").unwrap(),
        b"buy milk"
    );
    assert!(fx.storage.has_dir("/backup/notes"));

    std::fs::remove_file(&todo).unwrap();
    tx.send(WatchEvent::Change(RawEvent::file(EventKind::Deleted, &todo)))
        .await
        .unwrap();

    let outcomes = fx.reporter.wait_for(2).await;
    assert!(outcomes[1].success);
    assert!(!outcomes[1].skipped);
    assert_eq!(outcomes[1].kind, IntentKind::Delete);
    assert!(fx.storage.file("/backup/notes/todo.txt").is_none());
    assert_eq!(fx.storage.calls_of(Op::Delete), vec!["/backup/notes/todo.txt"]);

    shutdown.cancel();
    handle.await.unwrap().unwrap();
    assert!(fx.orchestrator.shutdown(Duration::from_secs(10)).await);
    assert_eq!(fx.reporter.outcomes().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_rename_moves_remote_file() {
    let fx = Fixture::new();
    fx.storage.add_dir("/backup");
    fx.storage.add_file("/backup/old.txt", b"moved");
    let (tx, rx) = mpsc::channel(64);
    let scheduler = SyncScheduler::new(
        rx,
        Duration::from_millis(500),
        fx.orchestrator.clone(),
        CancellationToken::new(),
    );
    let handle = tokio::spawn(scheduler.run());

    let new = fx.write("new.txt", b"moved");
    let old = fx.local("old.txt");
    tx.send(WatchEvent::Change(RawEvent::file(EventKind::Deleted, &old)))
        .await
        .unwrap();
    tx.send(WatchEvent::Change(RawEvent::file(EventKind::Created, &new)))
        .await
        .unwrap();
    drop(tx);

    handle.await.unwrap().unwrap();
    assert!(fx.orchestrator.shutdown(Duration::from_secs(10)).await);

    assert!(fx.storage.file("/backup/old.txt").is_none());
    assert_eq!(fx.storage.file("/backup/new.txt").unwrap(), b"moved");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_real_watcher_mirrors_new_file() {
    let fx = Fixture::new();
    std::fs::create_dir_all(fx.local("notes")).unwrap();

    let (mut watcher, rx) = FileWatcher::new(256).unwrap();
    watcher.watch(fx.root.local()).unwrap();
    let shutdown = CancellationToken::new();
    let scheduler = SyncScheduler::new(
        rx,
        Duration::from_millis(100),
        fx.orchestrator.clone(),
        shutdown.clone(),
    );
    let handle = tokio::spawn(scheduler.run());

    fx.write("notes/todo.txt", b"buy milk");

    let outcomes = fx.reporter.wait_for(1).await;
    assert!(outcomes.iter().any(|o| o.success
        && o.remote_path.as_str() == "/backup/notes/todo.txt"));
    assert_eq!(
        fx.storage.file("/backup/notes/todo.txt").unwrap(),
        b"buy milk"
    );

    drop(watcher);
    shutdown.cancel();
    handle.await.unwrap().unwrap();
    assert!(fx.orchestrator.shutdown(Duration::from_secs(10)).await);
}
