//! Scheduler loop: debouncing, overwrite-wins and lifecycle

use std::time::Duration;

use davsync_core::domain::event::{EventKind, IntentKind, RawEvent};
use davsync_sync::{scheduler::SyncScheduler, watcher::WatchEvent, SyncError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::common::{kinds, Fixture, Op};

const WINDOW: Duration = Duration::from_millis(300);

struct Running {
    tx: mpsc::Sender<WatchEvent>,
    shutdown: CancellationToken,
    handle: JoinHandle<Result<(), SyncError>>,
}

fn start(fx: &Fixture) -> Running {
    let (tx, rx) = mpsc::channel(64);
    let shutdown = CancellationToken::new();
    let scheduler = SyncScheduler::new(rx, WINDOW, fx.orchestrator.clone(), shutdown.clone());
    Running {
        tx,
        shutdown,
        handle: tokio::spawn(scheduler.run()),
    }
}

async fn send(running: &Running, kind: EventKind, path: &std::path::Path) {
    running
        .tx
        .send(WatchEvent::Change(RawEvent::file(kind, path)))
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_modifications_uploads_once_with_latest_content() {
    let fx = Fixture::new();
    let local = fx.write("draft.txt", b"v1");
    let running = start(&fx);

    send(&running, EventKind::Modified, &local).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    fx.write("draft.txt", b"v2");
    send(&running, EventKind::Modified, &local).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    fx.write("draft.txt", b"v3");
    send(&running, EventKind::Modified, &local).await;

    // Still inside the window of the last event
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(fx.storage.calls_of(Op::Put).is_empty());

    let outcomes = fx.reporter.wait_for(1).await;
    assert_eq!(kinds(&outcomes), vec![IntentKind::Upload]);
    assert_eq!(fx.storage.calls_of(Op::Put).len(), 1);
    assert_eq!(fx.storage.file("/backup/draft.txt").unwrap(), b"v3");

    drop(running.tx);
    running.handle.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_modify_then_delete_dispatches_only_delete() {
    let fx = Fixture::new();
    fx.storage.add_dir("/backup");
    fx.storage.add_file("/backup/a.txt", b"old");
    let local = fx.local("a.txt");
    let running = start(&fx);

    send(&running, EventKind::Modified, &local).await;
    send(&running, EventKind::Deleted, &local).await;
    drop(running.tx);
    running.handle.await.unwrap().unwrap();
    assert!(fx.orchestrator.shutdown(Duration::from_secs(10)).await);

    let outcomes = fx.reporter.outcomes();
    assert_eq!(kinds(&outcomes), vec![IntentKind::Delete]);
    assert!(outcomes[0].success);
    assert!(fx.storage.calls_of(Op::Put).is_empty());
    assert!(fx.storage.file("/backup/a.txt").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_directory_events_are_ignored() {
    let fx = Fixture::new();
    let dir = fx.local("photos");
    std::fs::create_dir_all(&dir).unwrap();
    let running = start(&fx);

    running
        .tx
        .send(WatchEvent::Change(RawEvent::directory(EventKind::Created, &dir)))
        .await
        .unwrap();
    drop(running.tx);
    running.handle.await.unwrap().unwrap();
    assert!(fx.orchestrator.shutdown(Duration::from_secs(1)).await);

    assert!(fx.reporter.outcomes().is_empty());
    assert!(fx.storage.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_distinct_paths_dispatch_independently() {
    let fx = Fixture::new();
    let a = fx.write("a.txt", b"a");
    let b = fx.write("b.txt", b"b");
    let running = start(&fx);

    send(&running, EventKind::Created, &a).await;
    // Keep refreshing b; a must still go out on time
    for _ in 0..5 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        send(&running, EventKind::Modified, &b).await;
    }

    let outcomes = fx.reporter.wait_for(1).await;
    assert_eq!(outcomes[0].local_path, a);
    assert!(fx.storage.file("/backup/b.txt").is_none());

    let outcomes = fx.reporter.wait_for(2).await;
    assert_eq!(outcomes[1].local_path, b);

    drop(running.tx);
    running.handle.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_drops_pending_intents() {
    let fx = Fixture::new();
    let local = fx.write("a.txt", b"x");
    let running = start(&fx);

    send(&running, EventKind::Created, &local).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    running.shutdown.cancel();
    running.handle.await.unwrap().unwrap();

    assert!(fx.orchestrator.shutdown(Duration::from_secs(1)).await);
    tokio::time::sleep(WINDOW * 2).await;
    assert!(fx.reporter.outcomes().is_empty());
    assert!(fx.storage.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_watcher_failure_is_fatal() {
    let fx = Fixture::new();
    let running = start(&fx);

    running
        .tx
        .send(WatchEvent::Failed("inotify watch limit reached".into()))
        .await
        .unwrap();

    let result = running.handle.await.unwrap();
    assert!(matches!(result, Err(SyncError::WatcherFailed(reason)) if reason.contains("inotify")));
}

#[tokio::test(start_paused = true)]
async fn test_closed_channel_flushes_pending_after_window() {
    let fx = Fixture::new();
    let local = fx.write("last.txt", b"final");
    let running = start(&fx);

    send(&running, EventKind::Created, &local).await;
    drop(running.tx);

    running.handle.await.unwrap().unwrap();
    assert!(fx.orchestrator.shutdown(Duration::from_secs(10)).await);
    assert_eq!(fx.storage.file("/backup/last.txt").unwrap(), b"final");
}
