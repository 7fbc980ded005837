//! Domain error types
//!
//! This module defines error types specific to domain operations:
//! path validation and mapping between the local and remote path spaces.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid local path format or content
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Invalid remote path format
    #[error("Invalid remote path: {0}")]
    InvalidRemotePath(String),

    /// Path is not a descendant of the watched root
    #[error("Path outside watched root: {path} is not within {root}")]
    PathOutsideRoot {
        /// The offending local path
        path: String,
        /// The watched local root
        root: String,
    },
}
