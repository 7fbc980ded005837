//! Sync scheduler - turns watch events into dispatched intents
//!
//! The [`SyncScheduler`] sits between the [`FileWatcher`](super::watcher::FileWatcher)
//! and the [`SyncOrchestrator`]. It feeds raw events into a [`Debouncer`] and
//! hands every settled intent to the orchestrator without waiting for it.
//!
//! ## Flow
//!
//! ```text
//! FileWatcher ──→ mpsc::Receiver ──→ SyncScheduler ──→ SyncOrchestrator::dispatch
//!                                        │
//!                                    Debouncer
//! ```
//!
//! Instead of polling on a fixed interval, the loop sleeps until the
//! earliest pending deadline.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{
    debouncer::Debouncer, orchestrator::SyncOrchestrator, watcher::WatchEvent, SyncError,
};

/// Event loop coupling the watcher, the debouncer and the orchestrator
pub struct SyncScheduler {
    /// Receiver for events from the FileWatcher
    events: mpsc::Receiver<WatchEvent>,
    debouncer: Debouncer,
    orchestrator: Arc<SyncOrchestrator>,
    shutdown: CancellationToken,
}

impl SyncScheduler {
    /// Creates a new `SyncScheduler`
    ///
    /// # Arguments
    /// * `events` - Channel receiver for watch events
    /// * `debounce_window` - How long a path must be quiet before dispatch
    /// * `orchestrator` - Where settled intents are dispatched
    /// * `shutdown` - Cancelling it stops the loop and drops pending intents
    pub fn new(
        events: mpsc::Receiver<WatchEvent>,
        debounce_window: Duration,
        orchestrator: Arc<SyncOrchestrator>,
        shutdown: CancellationToken,
    ) -> Self {
        info!(
            debounce_ms = debounce_window.as_millis() as u64,
            "Creating sync scheduler"
        );

        Self {
            events,
            debouncer: Debouncer::new(debounce_window),
            orchestrator,
            shutdown,
        }
    }

    /// Number of intents still waiting for their deadline
    pub fn pending_count(&self) -> usize {
        self.debouncer.pending_count()
    }

    /// Main event loop
    ///
    /// Runs until one of:
    /// - the shutdown token is cancelled (pending intents are dropped),
    /// - the event channel closes and every pending intent has been
    ///   dispatched,
    /// - the watcher reports a failure, which is returned as
    ///   [`SyncError::WatcherFailed`].
    pub async fn run(mut self) -> Result<(), SyncError> {
        info!("Sync scheduler starting");
        let mut channel_open = true;

        loop {
            if !channel_open && self.debouncer.is_empty() {
                info!("Event channel closed and nothing pending");
                break;
            }

            let deadline = self.debouncer.next_deadline();

            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => {
                    let dropped = self.debouncer.clear();
                    info!(dropped, "Shutdown requested, dropping undispatched intents");
                    break;
                }

                _ = sleep_until(deadline) => {
                    for intent in self.debouncer.poll() {
                        debug!(
                            path = %intent.local_path.display(),
                            kind = %intent.kind,
                            "Dispatching settled intent"
                        );
                        self.orchestrator.dispatch(intent);
                    }
                }

                message = self.events.recv(), if channel_open => match message {
                    Some(WatchEvent::Change(event)) => {
                        self.debouncer.push(event);
                    }
                    Some(WatchEvent::Failed(reason)) => {
                        error!(reason = %reason, "File watcher failed, events may have been lost");
                        return Err(SyncError::WatcherFailed(reason));
                    }
                    None => {
                        debug!(pending = self.debouncer.pending_count(), "Event channel closed");
                        channel_open = false;
                    }
                },
            }
        }

        info!("Sync scheduler stopped");
        Ok(())
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
