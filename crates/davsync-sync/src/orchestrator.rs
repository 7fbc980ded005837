//! Sync orchestrator - runs settled intents to completion
//!
//! The [`SyncOrchestrator`] receives [`PendingIntent`]s from the scheduler and
//! turns each into remote side effects through the [`IRemoteStorage`] port,
//! reporting exactly one [`SyncOutcome`] per mappable intent.
//!
//! ## Concurrency
//!
//! ```text
//! dispatch(intent) ──→ lanes[path] (FIFO) ──→ lane worker ──→ execute() ──→ permit per attempt
//!                                              (one per path)                (shared semaphore)
//! ```
//!
//! - Intents for the same local path are strictly serialized: a lane has at
//!   most one worker, which drains it in FIFO order.
//! - Intents for different paths run concurrently, bounded by the
//!   semaphore. A permit covers one remote attempt; it is released before
//!   a retry backoff so a failing path does not hold a slot while idle.
//! - Workers are tracked so [`shutdown`](SyncOrchestrator::shutdown) can
//!   wait for them, and aborted once the grace period runs out.
//!
//! ## Error handling
//!
//! | Failure                          | Result                                 |
//! |----------------------------------|----------------------------------------|
//! | Path outside root                | logged and dropped, no outcome         |
//! | Transient transport error        | retried, then failed outcome           |
//! | Permanent transport error        | failed outcome, no retry               |
//! | Local file vanished / is a dir   | skipped (successful) outcome           |
//! | Delete target already absent     | skipped (successful) outcome           |

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use dashmap::{mapref::entry::Entry, DashMap};
use davsync_core::{
    domain::{
        event::{IntentKind, SyncOutcome},
        newtypes::{RemotePath, WatchedRoot},
    },
    ports::{IOutcomeReporter, IRemoteStorage},
};
use tokio::sync::{Semaphore, SemaphorePermit};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, info, instrument, warn};

use crate::{
    debouncer::PendingIntent, dir_ensurer::RemoteDirEnsurer, mapper::map_to_remote,
    retry::RetryPolicy, SyncError,
};

// ============================================================================
// OrchestratorSettings
// ============================================================================

/// Immutable settings handed to the orchestrator at construction
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Local root and remote base being mirrored
    pub root: WatchedRoot,
    /// Maximum number of intents executing at once
    pub max_concurrent: usize,
    /// Retry policy for remote operations
    pub retry: RetryPolicy,
}

/// What a successful execution did on the remote side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Applied {
    /// The remote side was changed
    Changed,
    /// Nothing needed to change
    Skipped,
}

// ============================================================================
// SyncOrchestrator
// ============================================================================

/// Dispatches pending intents with per-path serialization
pub struct SyncOrchestrator {
    settings: OrchestratorSettings,
    storage: Arc<dyn IRemoteStorage>,
    ensurer: RemoteDirEnsurer,
    reporter: Arc<dyn IOutcomeReporter>,
    /// Queued intents per path; an entry exists while a worker owns the lane
    lanes: DashMap<PathBuf, VecDeque<PendingIntent>>,
    permits: Semaphore,
    tracker: TaskTracker,
    /// Fired when the shutdown grace period has elapsed
    abort: CancellationToken,
}

impl SyncOrchestrator {
    /// Creates an orchestrator over the given storage and reporter
    pub fn new(
        settings: OrchestratorSettings,
        storage: Arc<dyn IRemoteStorage>,
        reporter: Arc<dyn IOutcomeReporter>,
    ) -> Self {
        info!(
            root = %settings.root,
            max_concurrent = settings.max_concurrent,
            max_attempts = settings.retry.max_attempts,
            "Creating sync orchestrator"
        );

        Self {
            permits: Semaphore::new(settings.max_concurrent.max(1)),
            ensurer: RemoteDirEnsurer::new(Arc::clone(&storage)),
            settings,
            storage,
            reporter,
            lanes: DashMap::new(),
            tracker: TaskTracker::new(),
            abort: CancellationToken::new(),
        }
    }

    /// The settings this orchestrator was built with
    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// The remote directory ensurer shared by all dispatch units
    pub fn ensurer(&self) -> &RemoteDirEnsurer {
        &self.ensurer
    }

    /// Number of paths with queued or running work
    pub fn active_lanes(&self) -> usize {
        self.lanes.len()
    }

    /// Queues an intent behind any earlier work for the same path
    ///
    /// Returns immediately. Intents dispatched after
    /// [`shutdown`](Self::shutdown) started are dropped.
    pub fn dispatch(self: &Arc<Self>, intent: PendingIntent) {
        if self.tracker.is_closed() {
            warn!(path = %intent.local_path.display(), "Orchestrator shutting down, dropping intent");
            return;
        }

        let path = intent.local_path.clone();
        let start_worker = match self.lanes.entry(path.clone()) {
            Entry::Occupied(mut lane) => {
                debug!(
                    path = %path.display(),
                    kind = %intent.kind,
                    queued = lane.get().len() + 1,
                    "Queued behind in-flight operation"
                );
                lane.get_mut().push_back(intent);
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(VecDeque::from([intent]));
                true
            }
        };

        if start_worker {
            let this = Arc::clone(self);
            self.tracker.spawn(async move { this.run_lane(path).await });
        }
    }

    /// Drains one path's lane in FIFO order, then retires it
    async fn run_lane(self: Arc<Self>, path: PathBuf) {
        loop {
            let next = match self.lanes.get_mut(&path) {
                Some(mut lane) => lane.pop_front(),
                None => break,
            };

            match next {
                Some(intent) => self.run_intent(intent).await,
                None => {
                    // A dispatch may have slipped in since the pop
                    if self
                        .lanes
                        .remove_if(&path, |_, lane| lane.is_empty())
                        .is_some()
                    {
                        break;
                    }
                }
            }
        }
    }

    async fn run_intent(&self, intent: PendingIntent) {
        let outcome = tokio::select! {
            biased;
            _ = self.abort.cancelled() => self.aborted(&intent),
            outcome = self.execute(&intent) => outcome,
        };

        if let Some(outcome) = outcome {
            self.reporter.report(&outcome);
        }
    }

    fn aborted(&self, intent: &PendingIntent) -> Option<SyncOutcome> {
        let remote = map_to_remote(&intent.local_path, &self.settings.root).ok()?;
        Some(SyncOutcome::failed(
            intent.local_path.clone(),
            remote,
            intent.kind,
            0,
            SyncError::Aborted.to_string(),
        ))
    }

    /// Runs one intent to completion, including retries
    ///
    /// Returns `None` when the path cannot be mapped onto the remote side;
    /// such events are logged and dropped.
    #[instrument(skip_all, fields(path = %intent.local_path.display(), kind = %intent.kind))]
    pub async fn execute(&self, intent: &PendingIntent) -> Option<SyncOutcome> {
        let remote = match map_to_remote(&intent.local_path, &self.settings.root) {
            Ok(remote) => remote,
            Err(err) => {
                warn!(error = %err, "Dropping event that cannot be mapped");
                return None;
            }
        };

        let local = intent.local_path.clone();
        let (result, attempts) = match intent.kind {
            IntentKind::Upload => self.upload(&local, &remote).await,
            IntentKind::Delete => self.delete(&remote).await,
        };

        Some(match result {
            Ok(Applied::Changed) => SyncOutcome::succeeded(local, remote, intent.kind, attempts),
            Ok(Applied::Skipped) => SyncOutcome::skipped(local, remote, intent.kind, attempts),
            Err(err) => SyncOutcome::failed(local, remote, intent.kind, attempts, render(&err)),
        })
    }

    async fn upload(&self, local: &Path, remote: &RemotePath) -> (Result<Applied, SyncError>, u32) {
        match tokio::fs::metadata(local).await {
            Ok(meta) if meta.is_dir() => {
                debug!("Path is a directory, nothing to upload");
                return (Ok(Applied::Skipped), 0);
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("Local file vanished before upload");
                return (Ok(Applied::Skipped), 0);
            }
            // Other metadata errors surface from put() with a proper cause
            _ => {}
        }

        let this = self;
        self.settings
            .retry
            .run("upload", move |attempt| async move {
                let _permit = match this.permit().await {
                    Ok(permit) => permit,
                    Err(err) => return Err(err),
                };
                debug!(attempt, remote = %remote, "Uploading");
                let result = this.upload_once(local, remote).await;
                if result.is_err() {
                    this.ensurer.invalidate_ancestors(remote);
                }
                result
            })
            .await
    }

    /// Waits for a concurrency slot for one remote attempt
    async fn permit(&self) -> Result<SemaphorePermit<'_>, SyncError> {
        self.permits.acquire().await.map_err(|_| SyncError::Aborted)
    }

    async fn upload_once(&self, local: &Path, remote: &RemotePath) -> Result<Applied, SyncError> {
        self.ensurer.ensure(remote).await?;
        match self.storage.put(local, remote).await {
            Ok(()) => Ok(Applied::Changed),
            Err(err) if err.is_local_file_missing() => {
                debug!("Local file vanished during upload");
                Ok(Applied::Skipped)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, remote: &RemotePath) -> (Result<Applied, SyncError>, u32) {
        let this = self;
        self.settings
            .retry
            .run("delete", move |attempt| async move {
                let _permit = match this.permit().await {
                    Ok(permit) => permit,
                    Err(err) => return Err(err),
                };
                debug!(attempt, remote = %remote, "Deleting");
                this.delete_once(remote).await
            })
            .await
    }

    async fn delete_once(&self, remote: &RemotePath) -> Result<Applied, SyncError> {
        if !self.storage.exists(remote).await? {
            debug!("Remote target already absent");
            return Ok(Applied::Skipped);
        }
        self.storage.delete(remote).await?;
        Ok(Applied::Changed)
    }

    /// Stops accepting intents and waits for in-flight work
    ///
    /// Work still running after `grace` is aborted and reported as failed.
    /// Returns true if everything finished within the grace period.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.tracker.close();
        info!(
            lanes = self.lanes.len(),
            grace_ms = grace.as_millis() as u64,
            "Draining in-flight operations"
        );

        if tokio::time::timeout(grace, self.tracker.wait()).await.is_ok() {
            info!("All in-flight operations finished");
            return true;
        }

        warn!(lanes = self.lanes.len(), "Grace period elapsed, aborting in-flight operations");
        self.abort.cancel();
        self.tracker.wait().await;
        false
    }
}

/// Renders an error with its source chain
fn render(err: &SyncError) -> String {
    let mut rendered = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !rendered.contains(&cause_text) {
            rendered.push_str(": ");
            rendered.push_str(&cause_text);
        }
        source = cause.source();
    }
    rendered
}
