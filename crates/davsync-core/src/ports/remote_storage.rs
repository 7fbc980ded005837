//! Remote storage port (driven/secondary port)
//!
//! This module defines the interface the sync orchestrator uses to mirror
//! files onto the remote endpoint. The primary implementation is the WebDAV
//! client in `davsync-webdav`, but the orchestrator depends only on this
//! trait, never on the concrete client.
//!
//! ## Design Notes
//!
//! - Unlike most ports, errors here are typed ([`TransportError`]) because the
//!   orchestrator's retry policy must tell transient failures from permanent
//!   ones. [`TransportError::is_transient`] is the single classification point.
//! - Every operation must be safe to invoke repeatedly: `mkdir` tolerates an
//!   existing collection and `delete` tolerates an absent target.
//! - Methods are `async`: from the caller's point of view they block until the
//!   remote side has answered.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::newtypes::RemotePath;

// ============================================================================
// TransportError
// ============================================================================

/// Errors reported by a remote storage transport
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request did not complete within the configured timeout
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Connection-level failure (refused, reset, DNS)
    #[error("Network error: {0}")]
    Network(String),

    /// The server failed to handle the request (5xx)
    #[error("Server error {status}: {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Response reason or body excerpt
        message: String,
    },

    /// The server asked us to slow down or the resource is locked
    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    /// The parent collection vanished between the directory check and the
    /// write; retrying after re-validating ancestors usually fixes it
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Credentials were rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Credentials are valid but lack permission
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The server rejected the remote path itself
    #[error("Invalid remote path: {0}")]
    InvalidPath(String),

    /// Any other status the transport does not know how to classify
    #[error("Unexpected status {status}: {message}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response reason or body excerpt
        message: String,
    },

    /// The local source file disappeared before it could be read
    #[error("Local file missing: {}", .0.display())]
    LocalFileMissing(PathBuf),

    /// The local source file exists but could not be read
    #[error("Local I/O error on {}: {message}", path.display())]
    LocalIo {
        /// The local file being read
        path: PathBuf,
        /// The underlying I/O error message
        message: String,
    },
}

impl TransportError {
    /// Returns true if retrying the same operation may succeed
    ///
    /// Transient: timeouts, connection failures, 5xx, throttling and
    /// parent-missing conflicts. Everything else is permanent.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout(_)
                | TransportError::Network(_)
                | TransportError::Server { .. }
                | TransportError::TooManyRequests(_)
                | TransportError::Conflict(_)
        )
    }

    /// Returns true if the error is the benign "source file vanished" race
    #[must_use]
    pub fn is_local_file_missing(&self) -> bool {
        matches!(self, TransportError::LocalFileMissing(_))
    }
}

// ============================================================================
// IRemoteStorage trait
// ============================================================================

/// Port trait for remote storage operations
///
/// ## Implementation Notes
///
/// - `exists` returns `Ok(false)` for a missing resource; only genuine
///   failures are errors.
/// - `mkdir` creates a single collection. Callers create parents first;
///   an already-existing collection is success.
/// - `put` overwrites unconditionally (last writer wins). A missing local
///   source must be reported as [`TransportError::LocalFileMissing`].
/// - `delete` of an absent resource is success.
#[async_trait::async_trait]
pub trait IRemoteStorage: Send + Sync {
    /// Checks whether a file or collection exists at `path`
    async fn exists(&self, path: &RemotePath) -> Result<bool, TransportError>;

    /// Creates the collection at `path`
    async fn mkdir(&self, path: &RemotePath) -> Result<(), TransportError>;

    /// Uploads the content of `local` to `remote`
    async fn put(&self, local: &Path, remote: &RemotePath) -> Result<(), TransportError>;

    /// Deletes the resource at `path`
    async fn delete(&self, path: &RemotePath) -> Result<(), TransportError>;
}
