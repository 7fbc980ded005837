//! Per-path event debouncing
//!
//! The [`Debouncer`] absorbs bursts of raw events for the same path (editors
//! that write then rename, large copies emitting many writes) into a single
//! [`PendingIntent`]. A later event for a path overwrites its pending intent
//! and pushes the deadline out; nothing is ever stacked.
//!
//! ```text
//! RawEvent ──→ push() ──→ pending[path] = { kind, now + window }
//!                                │
//!                   poll() once deadline elapsed
//!                                ▼
//!                          PendingIntent ──→ SyncOrchestrator
//! ```
//!
//! Deadlines use [`tokio::time::Instant`], so paused-clock tests control them.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use davsync_core::domain::event::{IntentKind, RawEvent};
use tokio::time::Instant;
use tracing::debug;

// ============================================================================
// PendingIntent
// ============================================================================

/// The latest effective disposition awaiting dispatch for one local path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingIntent {
    /// Absolute local path this intent is for
    pub local_path: PathBuf,
    /// Upload or Delete
    pub kind: IntentKind,
    /// When the intent becomes eligible for dispatch
    pub deadline: Instant,
}

impl PendingIntent {
    /// Creates an intent that is due immediately
    pub fn new(local_path: impl Into<PathBuf>, kind: IntentKind) -> Self {
        Self {
            local_path: local_path.into(),
            kind,
            deadline: Instant::now(),
        }
    }
}

// ============================================================================
// Debouncer
// ============================================================================

/// Coalesces raw events per path over a fixed window
#[derive(Debug)]
pub struct Debouncer {
    /// At most one pending intent per path
    pending: HashMap<PathBuf, PendingIntent>,
    window: Duration,
}

impl Debouncer {
    /// Creates a debouncer with the given quiet window
    pub fn new(window: Duration) -> Self {
        Self {
            pending: HashMap::new(),
            window,
        }
    }

    /// The configured debounce window
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Folds a raw event into the pending set
    ///
    /// Directory events are discarded: directories are created remotely as
    /// a side effect of uploads and never synced on their own. Returns
    /// whether the event was accepted.
    pub fn push(&mut self, event: RawEvent) -> bool {
        if event.is_directory {
            debug!(path = %event.local_path.display(), kind = ?event.kind, "Ignoring directory event");
            return false;
        }

        let kind = event.intent_kind();
        let deadline = Instant::now() + self.window;
        match self.pending.get_mut(&event.local_path) {
            Some(intent) => {
                if intent.kind != kind {
                    debug!(
                        path = %event.local_path.display(),
                        from = %intent.kind,
                        to = %kind,
                        "Pending intent overwritten"
                    );
                }
                intent.kind = kind;
                intent.deadline = deadline;
            }
            None => {
                debug!(path = %event.local_path.display(), kind = %kind, "New pending intent");
                self.pending.insert(
                    event.local_path.clone(),
                    PendingIntent {
                        local_path: event.local_path,
                        kind,
                        deadline,
                    },
                );
            }
        }
        true
    }

    /// Removes and returns every intent whose deadline has elapsed
    ///
    /// Intents come back ordered by deadline.
    pub fn poll(&mut self) -> Vec<PendingIntent> {
        let now = Instant::now();
        let settled_paths: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|(_, intent)| intent.deadline <= now)
            .map(|(path, _)| path.clone())
            .collect();

        let mut settled: Vec<PendingIntent> = settled_paths
            .iter()
            .filter_map(|path| self.pending.remove(path))
            .collect();
        settled.sort_by_key(|intent| intent.deadline);

        if !settled.is_empty() {
            debug!(count = settled.len(), "Settled pending intents");
        }
        settled
    }

    /// The earliest pending deadline, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|intent| intent.deadline).min()
    }

    /// Drops every pending intent, returning how many were dropped
    pub fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    /// Returns the number of pending intents
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if nothing is pending
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
