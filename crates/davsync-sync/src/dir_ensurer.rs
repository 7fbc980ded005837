//! Remote directory creation with a per-run cache
//!
//! Before a file is uploaded every ancestor collection must exist remotely.
//! [`RemoteDirEnsurer`] checks them shallowest first, creates the missing
//! ones and remembers what it has confirmed so later uploads under the same
//! directories skip the round trips.
//!
//! The cache is shared by concurrent dispatch units. Two units racing on the
//! same missing directory may both issue `MKCOL`; the transport treats an
//! existing collection as success, so that costs a request, not correctness.

use std::sync::Arc;

use dashmap::DashSet;
use davsync_core::{domain::newtypes::RemotePath, ports::IRemoteStorage};
use tracing::debug;

use crate::SyncError;

/// Guarantees remote ancestor directories exist before file operations
pub struct RemoteDirEnsurer {
    storage: Arc<dyn IRemoteStorage>,
    /// Remote directories confirmed or created during this run
    cache: DashSet<RemotePath>,
}

impl RemoteDirEnsurer {
    /// Creates an ensurer with an empty cache
    pub fn new(storage: Arc<dyn IRemoteStorage>) -> Self {
        Self {
            storage,
            cache: DashSet::new(),
        }
    }

    /// Ensures every ancestor of `remote_file` exists, parent before child
    ///
    /// # Errors
    /// Returns [`SyncError::RemoteDir`] naming the first ancestor whose
    /// check or creation failed; deeper ancestors are not attempted.
    pub async fn ensure(&self, remote_file: &RemotePath) -> Result<(), SyncError> {
        for dir in remote_file.ancestors() {
            if self.cache.contains(&dir) {
                continue;
            }

            let exists = self
                .storage
                .exists(&dir)
                .await
                .map_err(|cause| SyncError::RemoteDir {
                    path: dir.clone(),
                    cause,
                })?;

            if exists {
                debug!(dir = %dir, "Remote directory exists");
            } else {
                self.storage
                    .mkdir(&dir)
                    .await
                    .map_err(|cause| SyncError::RemoteDir {
                        path: dir.clone(),
                        cause,
                    })?;
                debug!(dir = %dir, "Created remote directory");
            }

            self.cache.insert(dir);
        }
        Ok(())
    }

    /// Forgets the cached ancestors of `remote_file`
    ///
    /// Called after a failed attempt so the next attempt re-checks them
    /// instead of trusting a possibly stale entry.
    pub fn invalidate_ancestors(&self, remote_file: &RemotePath) {
        for dir in remote_file.ancestors() {
            if self.cache.remove(&dir).is_some() {
                debug!(dir = %dir, "Invalidated cached remote directory");
            }
        }
    }

    /// Returns true if `dir` is currently cached as existing
    pub fn is_cached(&self, dir: &RemotePath) -> bool {
        self.cache.contains(dir)
    }

    /// Number of cached directories
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}
