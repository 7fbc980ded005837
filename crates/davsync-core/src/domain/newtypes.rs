//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for the two path spaces the
//! mirror works with: local filesystem paths under the watched root and
//! remote WebDAV paths under the remote base. Each newtype ensures data
//! validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// RemotePath
// ============================================================================

/// A remote WebDAV path (must start with /)
///
/// Represents paths relative to the server endpoint, e.g., "/backup/notes/todo.txt".
/// Segments are stored unencoded; percent-encoding is the transport's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RemotePath(String);

impl RemotePath {
    /// Create a new RemotePath
    ///
    /// A single trailing slash is accepted and stripped (`/backup/` becomes
    /// `/backup`).
    ///
    /// # Errors
    /// Returns error if path doesn't start with /, contains empty segments
    /// or contains `.`/`..` segments
    pub fn new(path: String) -> Result<Self, DomainError> {
        if !path.starts_with('/') {
            return Err(DomainError::InvalidRemotePath(format!(
                "Remote path must start with '/': {path}"
            )));
        }

        let trimmed = if path.len() > 1 && path.ends_with('/') {
            &path[..path.len() - 1]
        } else {
            path.as_str()
        };

        if trimmed.len() > 1 && trimmed.contains("//") {
            return Err(DomainError::InvalidRemotePath(format!(
                "Remote path contains invalid double slashes: {path}"
            )));
        }

        if trimmed.split('/').any(|segment| segment == ".." || segment == ".") {
            return Err(DomainError::InvalidRemotePath(format!(
                "Remote path contains invalid traversal: {path}"
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Create the root path "/"
    #[must_use]
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if this is the root path "/"
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Join a single path segment
    ///
    /// # Errors
    /// Returns error if the segment is empty, contains a slash or is a
    /// traversal segment
    pub fn join(&self, segment: &str) -> Result<Self, DomainError> {
        if segment.is_empty() || segment.contains('/') || segment == ".." || segment == "." {
            return Err(DomainError::InvalidRemotePath(format!(
                "Invalid path segment: {segment}"
            )));
        }

        let new_path = if self.is_root() {
            format!("/{segment}")
        } else {
            format!("{}/{segment}", self.0)
        };

        Self::new(new_path)
    }

    /// Get the parent path
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }

        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// Get the file name component
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }

        self.0.rsplit('/').next()
    }

    /// Returns the path segments, without the leading root
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Returns every proper ancestor directory, shallowest first
    ///
    /// The root "/" and the path itself are excluded, so
    /// `/backup/notes/todo.txt` yields `/backup` then `/backup/notes`.
    #[must_use]
    pub fn ancestors(&self) -> Vec<Self> {
        let mut ancestors = Vec::new();
        let mut current = self.parent();
        while let Some(dir) = current {
            if dir.is_root() {
                break;
            }
            current = dir.parent();
            ancestors.push(dir);
        }
        ancestors.reverse();
        ancestors
    }
}

impl Display for RemotePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RemotePath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for RemotePath {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RemotePath> for String {
    fn from(path: RemotePath) -> Self {
        path.0
    }
}

// ============================================================================
// WatchedRoot
// ============================================================================

/// The immutable pairing of the local watched directory and the remote base
///
/// Set once at startup and never mutated. The local side is normalized
/// lexically (no filesystem access), so it does not need to exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedRoot {
    local: PathBuf,
    remote: RemotePath,
}

impl WatchedRoot {
    /// Creates a new WatchedRoot
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPath` if the local path is not absolute
    /// or escapes its own root via `..`
    pub fn new(local: impl Into<PathBuf>, remote: RemotePath) -> Result<Self, DomainError> {
        let local = local.into();
        if !local.is_absolute() {
            return Err(DomainError::InvalidPath(format!(
                "Watched root must be absolute: {}",
                local.display()
            )));
        }

        Ok(Self {
            local: normalize_path(&local)?,
            remote,
        })
    }

    /// The local directory being watched
    #[must_use]
    pub fn local(&self) -> &Path {
        &self.local
    }

    /// The remote base path that mirrors the local root
    #[must_use]
    pub fn remote(&self) -> &RemotePath {
        &self.remote
    }
}

impl Display for WatchedRoot {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.local.display(), self.remote)
    }
}

/// Normalize a path by resolving . and .. components lexically
pub fn normalize_path(path: &Path) -> Result<PathBuf, DomainError> {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(p) => normalized.push(p.as_os_str()),
            Component::RootDir => normalized.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(DomainError::InvalidPath(
                        "Path escapes root via ..".to_string(),
                    ));
                }
            }
            Component::Normal(c) => normalized.push(c),
        }
    }

    Ok(normalized)
}
