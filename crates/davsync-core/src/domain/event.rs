//! Filesystem events, sync intents and their outcomes
//!
//! A [`RawEvent`] is what the watcher observed. It is folded into a pending
//! intent of some [`IntentKind`] by the debouncer, and every dispatched intent
//! terminates in exactly one [`SyncOutcome`].

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use super::newtypes::RemotePath;

// ============================================================================
// RawEvent
// ============================================================================

/// Kind of change reported by the filesystem watcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A new entry appeared
    Created,
    /// An existing entry changed (content or metadata)
    Modified,
    /// An entry was removed
    Deleted,
}

/// An unprocessed change notification from the watcher
///
/// Ephemeral: it is either folded into a pending intent or discarded.
/// Delivery is at-least-once, so duplicates are expected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// What happened
    pub kind: EventKind,
    /// Absolute local path of the entry
    pub local_path: PathBuf,
    /// Whether the entry is a directory
    pub is_directory: bool,
    /// When the watcher observed the change
    pub observed_at: DateTime<Utc>,
}

impl RawEvent {
    /// Creates a file event observed now
    pub fn file(kind: EventKind, local_path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            local_path: local_path.into(),
            is_directory: false,
            observed_at: Utc::now(),
        }
    }

    /// Creates a directory event observed now
    pub fn directory(kind: EventKind, local_path: impl Into<PathBuf>) -> Self {
        Self {
            is_directory: true,
            ..Self::file(kind, local_path)
        }
    }

    /// The effective disposition this event asks for
    #[must_use]
    pub fn intent_kind(&self) -> IntentKind {
        match self.kind {
            EventKind::Created | EventKind::Modified => IntentKind::Upload,
            EventKind::Deleted => IntentKind::Delete,
        }
    }
}

// ============================================================================
// IntentKind
// ============================================================================

/// Effective disposition for a path once its events have been coalesced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentKind {
    /// Transfer the current local content to the remote path
    Upload,
    /// Remove the remote copy
    Delete,
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntentKind::Upload => write!(f, "upload"),
            IntentKind::Delete => write!(f, "delete"),
        }
    }
}

// ============================================================================
// SyncOutcome
// ============================================================================

/// Terminal result of one dispatched intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Local path the intent was for
    pub local_path: PathBuf,
    /// Remote path it was mapped to
    pub remote_path: RemotePath,
    /// Upload or Delete
    pub kind: IntentKind,
    /// Whether the remote side now reflects the intent
    pub success: bool,
    /// Rendered error chain for failed outcomes
    pub error: Option<String>,
    /// Number of remote attempts made (0 when nothing had to be sent)
    pub attempts: u32,
    /// True when the intent was satisfied without a remote change
    /// (local file vanished, path is a directory, delete target already gone)
    pub skipped: bool,
    /// When the intent finished
    pub finished_at: DateTime<Utc>,
}

impl SyncOutcome {
    /// A successful outcome that changed the remote side
    pub fn succeeded(
        local_path: PathBuf,
        remote_path: RemotePath,
        kind: IntentKind,
        attempts: u32,
    ) -> Self {
        Self {
            local_path,
            remote_path,
            kind,
            success: true,
            error: None,
            attempts,
            skipped: false,
            finished_at: Utc::now(),
        }
    }

    /// A successful outcome that needed no remote change
    pub fn skipped(
        local_path: PathBuf,
        remote_path: RemotePath,
        kind: IntentKind,
        attempts: u32,
    ) -> Self {
        Self {
            skipped: true,
            ..Self::succeeded(local_path, remote_path, kind, attempts)
        }
    }

    /// A failed outcome carrying the rendered error
    pub fn failed(
        local_path: PathBuf,
        remote_path: RemotePath,
        kind: IntentKind,
        attempts: u32,
        error: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::succeeded(local_path, remote_path, kind, attempts)
        }
    }
}
