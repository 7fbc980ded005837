//! Recursive filesystem watching
//!
//! Provides a [`FileWatcher`] that wraps the `notify` crate to monitor the
//! watched root, converting raw OS events into [`RawEvent`] values and
//! forwarding them over a bounded channel.
//!
//! ## Architecture
//!
//! ```text
//! inotify / FSEvents / ReadDirectoryChangesW
//!       │
//!       ▼
//!  FileWatcher  ──→  mpsc::channel<WatchEvent>  ──→  SyncScheduler
//! ```
//!
//! Delivery is at-least-once: the same change may be reported more than
//! once, and renames surface as a delete of the old path plus a create of
//! the new one.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use davsync_core::domain::event::{EventKind as ChangeKind, RawEvent};
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

// ============================================================================
// WatchEvent
// ============================================================================

/// Message sent from the watcher to the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A filesystem change
    Change(RawEvent),
    /// The watch backend failed; events may have been lost
    Failed(String),
}

// ============================================================================
// FileWatcher
// ============================================================================

/// Watches a directory tree using the OS-native mechanism
///
/// Dropping the watcher stops event production and, once every clone of
/// the sender is gone, closes the channel.
///
/// ## Usage
///
/// ```ignore
/// let (mut watcher, rx) = FileWatcher::new(1024)?;
/// watcher.watch(Path::new("/home/user/Documents"))?;
/// // rx.recv().await to get events
/// ```
pub struct FileWatcher {
    /// The underlying notify watcher instance
    watcher: RecommendedWatcher,
    /// Paths currently watched
    watched: Vec<PathBuf>,
}

impl FileWatcher {
    /// Creates a new watcher and the receiving end of its event channel
    ///
    /// # Arguments
    /// * `capacity` - Bound of the event channel; the backend thread blocks
    ///   when the scheduler falls this far behind
    ///
    /// # Errors
    /// Returns an error if the underlying OS watcher cannot be created
    pub fn new(capacity: usize) -> Result<(Self, mpsc::Receiver<WatchEvent>)> {
        let (tx, rx) = mpsc::channel::<WatchEvent>(capacity.max(1));

        let watcher = RecommendedWatcher::new(
            move |res: std::result::Result<notify::Event, notify::Error>| {
                let messages: Vec<WatchEvent> = match res {
                    Ok(event) => map_notify_event(&event)
                        .into_iter()
                        .map(WatchEvent::Change)
                        .collect(),
                    Err(err) => {
                        error!(error = %err, "File watcher error");
                        vec![WatchEvent::Failed(err.to_string())]
                    }
                };
                for message in messages {
                    if tx.blocking_send(message).is_err() {
                        warn!("Failed to send watch event (receiver dropped)");
                        break;
                    }
                }
            },
            notify::Config::default(),
        )
        .context("Failed to create file watcher")?;

        Ok((
            Self {
                watcher,
                watched: Vec::new(),
            },
            rx,
        ))
    }

    /// Starts watching a directory recursively
    ///
    /// # Errors
    /// Returns an error if the path cannot be watched (does not exist,
    /// insufficient permissions, or inotify watch limit reached)
    pub fn watch(&mut self, path: &Path) -> Result<()> {
        self.watcher
            .watch(path, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch path: {}", path.display()))?;

        info!(path = %path.display(), "Watching started");
        self.watched.push(path.to_path_buf());
        Ok(())
    }

    /// Stops watching a directory
    ///
    /// # Errors
    /// Returns an error if the path was not being watched
    pub fn unwatch(&mut self, path: &Path) -> Result<()> {
        self.watcher
            .unwatch(path)
            .with_context(|| format!("Failed to unwatch path: {}", path.display()))?;

        info!(path = %path.display(), "Watching stopped");
        self.watched.retain(|watched| watched != path);
        Ok(())
    }

    /// Paths currently being watched
    pub fn watched(&self) -> &[PathBuf] {
        &self.watched
    }
}

// ============================================================================
// Event mapping - notify::Event → RawEvent
// ============================================================================

/// Converts a `notify::Event` into zero or more [`RawEvent`]s
///
/// - `Create(*)` -> `Created`
/// - `Modify(Name(Both))` with 2 paths -> `Deleted(old)` + `Created(new)`
/// - `Modify(Name(From))` -> `Deleted`, `Modify(Name(To))` -> `Created`
/// - `Modify(Name(Any))` -> `Created` if the path exists, else `Deleted`
/// - Other `Modify(*)` -> `Modified`
/// - `Remove(*)` -> `Deleted`
///
/// Access and other event kinds are ignored.
fn map_notify_event(event: &notify::Event) -> Vec<RawEvent> {
    let Some(path) = event.paths.first() else {
        return Vec::new();
    };

    let mapped = match &event.kind {
        EventKind::Create(kind) => {
            let is_dir = match kind {
                CreateKind::Folder => true,
                CreateKind::File => false,
                _ => path.is_dir(),
            };
            vec![raw(ChangeKind::Created, path, is_dir)]
        }

        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match event.paths.get(1) {
            Some(new) => {
                let is_dir = new.is_dir();
                vec![
                    raw(ChangeKind::Deleted, path, is_dir),
                    raw(ChangeKind::Created, new, is_dir),
                ]
            }
            None => vec![raw(ChangeKind::Modified, path, path.is_dir())],
        },

        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            vec![raw(ChangeKind::Deleted, path, false)]
        }

        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            vec![raw(ChangeKind::Created, path, path.is_dir())]
        }

        EventKind::Modify(ModifyKind::Name(_)) => {
            if path.exists() {
                vec![raw(ChangeKind::Created, path, path.is_dir())]
            } else {
                vec![raw(ChangeKind::Deleted, path, false)]
            }
        }

        EventKind::Modify(_) => vec![raw(ChangeKind::Modified, path, path.is_dir())],

        EventKind::Remove(kind) => {
            // The entry is gone, so only the event kind can tell
            vec![raw(ChangeKind::Deleted, path, matches!(kind, RemoveKind::Folder))]
        }

        _ => {
            debug!(kind = ?event.kind, "Ignoring event kind");
            Vec::new()
        }
    };

    for change in &mapped {
        debug!(
            path = %change.local_path.display(),
            kind = ?change.kind,
            is_directory = change.is_directory,
            "Mapped notify event"
        );
    }
    mapped
}

fn raw(kind: ChangeKind, path: &Path, is_directory: bool) -> RawEvent {
    if is_directory {
        RawEvent::directory(kind, path)
    } else {
        RawEvent::file(kind, path)
    }
}
