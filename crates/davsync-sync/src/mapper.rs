//! Local to remote path mapping
//!
//! Pure and stateless: the remote path of a local file is the remote base
//! followed by the file's path relative to the local root, one segment at a
//! time. Separators never cross the boundary as characters.

use std::path::{Component, Path};

use davsync_core::domain::{
    errors::DomainError,
    newtypes::{normalize_path, RemotePath, WatchedRoot},
};

/// Maps a local path under the watched root to its remote counterpart
///
/// # Errors
/// - [`DomainError::PathOutsideRoot`] if `local` is not a strict descendant
///   of the local root (the root itself included)
/// - [`DomainError::InvalidPath`] if a segment is not valid UTF-8
/// - [`DomainError::InvalidRemotePath`] if a segment cannot be used remotely
pub fn map_to_remote(local: &Path, root: &WatchedRoot) -> Result<RemotePath, DomainError> {
    let outside = || DomainError::PathOutsideRoot {
        path: local.display().to_string(),
        root: root.local().display().to_string(),
    };

    if !local.is_absolute() {
        return Err(outside());
    }

    let normalized = normalize_path(local)?;
    let relative = normalized.strip_prefix(root.local()).map_err(|_| outside())?;

    let mut remote = root.remote().clone();
    let mut depth = 0usize;
    for component in relative.components() {
        let Component::Normal(segment) = component else {
            return Err(outside());
        };
        let segment = segment.to_str().ok_or_else(|| {
            DomainError::InvalidPath(format!("Non UTF-8 path: {}", local.display()))
        })?;
        remote = remote.join(segment)?;
        depth += 1;
    }

    if depth == 0 {
        return Err(outside());
    }

    Ok(remote)
}
