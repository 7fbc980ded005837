//! DavSync WebDAV - Remote storage transport over WebDAV
//!
//! Provides an async client for the four operations the mirror needs:
//! - Existence checks (`PROPFIND`, depth 0)
//! - Collection creation (`MKCOL`)
//! - Unconditional file upload (`PUT`)
//! - Deletion (`DELETE`)
//!
//! ## Modules
//!
//! - [`client`] - HTTP client with basic auth, timeouts and URL construction
//! - [`provider`] - [`IRemoteStorage`](davsync_core::ports::IRemoteStorage) implementation
//! - [`status`] - Mapping of HTTP statuses and client errors to transport errors

pub mod client;
pub mod provider;
pub mod status;

pub use client::{WebDavClient, WebDavConfig};
pub use provider::WebDavStorage;

use thiserror::Error;

/// Errors that can occur while setting up the WebDAV client
///
/// Request-time failures are reported as
/// [`TransportError`](davsync_core::ports::TransportError) instead, so the
/// orchestrator can classify them.
#[derive(Debug, Error)]
pub enum WebDavError {
    /// The endpoint URL could not be parsed or cannot carry a path
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),

    /// The underlying HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    /// A WebDAV extension method could not be constructed
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),
}
