//! DavSync Sync - One-way mirror orchestration
//!
//! Provides:
//! - Local-to-remote path mapping
//! - Per-path event debouncing and coalescing
//! - Memoized remote directory creation
//! - Per-path serialized, bounded-concurrency dispatch with retries
//!
//! ## Modules
//!
//! - [`mapper`] - Pure translation of local paths to remote paths
//! - [`debouncer`] - Collapses bursts of raw events into pending intents
//! - [`dir_ensurer`] - Creates missing remote ancestors, with a per-run cache
//! - [`retry`] - Bounded exponential backoff for transient failures
//! - [`orchestrator`] - Runs intents to completion and reports outcomes
//! - [`watcher`] - `notify`-based recursive watcher producing raw events
//! - [`scheduler`] - Event loop tying the watcher, debouncer and orchestrator
//! - [`reporter`] - Outcome reporter that logs through `tracing`

pub mod debouncer;
pub mod dir_ensurer;
pub mod mapper;
pub mod orchestrator;
pub mod reporter;
pub mod retry;
pub mod scheduler;
pub mod watcher;

use davsync_core::{
    domain::{errors::DomainError, newtypes::RemotePath},
    ports::TransportError,
};
use thiserror::Error;

/// Errors that can occur while mirroring a path
#[derive(Debug, Error)]
pub enum SyncError {
    /// The local path could not be mapped onto the remote side
    #[error("Mapping error: {0}")]
    Mapping(#[from] DomainError),

    /// An ancestor collection could not be checked or created
    #[error("Failed to ensure remote directory {path}: {cause}")]
    RemoteDir {
        /// The ancestor that failed
        path: RemotePath,
        /// The transport failure behind it
        #[source]
        cause: TransportError,
    },

    /// The file operation itself failed
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The filesystem watcher stopped delivering events
    #[error("File watcher failed: {0}")]
    WatcherFailed(String),

    /// In-flight work was cancelled after the shutdown grace period
    #[error("Operation aborted during shutdown")]
    Aborted,
}

impl SyncError {
    /// Returns true if the failed operation is worth retrying
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::RemoteDir { cause, .. } => cause.is_transient(),
            SyncError::Transport(err) => err.is_transient(),
            SyncError::Mapping(_) | SyncError::WatcherFailed(_) | SyncError::Aborted => false,
        }
    }
}
