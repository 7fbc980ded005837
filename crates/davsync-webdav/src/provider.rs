//! WebDavStorage - IRemoteStorage implementation over WebDAV
//!
//! Wraps the [`WebDavClient`] and interprets the server's answers for the
//! four operations of the [`IRemoteStorage`] port.
//!
//! ## Design Notes
//!
//! - `exists` issues a depth-0 `PROPFIND` requesting only `resourcetype`.
//!   200 and 207 mean present, 404 means absent.
//! - `mkcol` answers 405 when the collection already exists; that counts as
//!   success so concurrent ensurers never fail each other.
//! - `put` streams the file from disk with an explicit `Content-Length`.
//!   The file is reopened for every attempt.
//! - `delete` treats 404 as success.

use std::path::Path;

use async_trait::async_trait;
use reqwest::{header, Body, Method, StatusCode};
use tracing::debug;

use davsync_core::domain::newtypes::RemotePath;
use davsync_core::ports::{IRemoteStorage, TransportError};

use crate::client::WebDavClient;
use crate::status::classify_status;

/// Body of the existence probe
const PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:propfind xmlns:d="DAV:"><d:prop><d:resourcetype/></d:prop></d:propfind>"#;

/// Remote storage backed by a WebDAV server
#[derive(Debug)]
pub struct WebDavStorage {
    client: WebDavClient,
}

impl WebDavStorage {
    /// Creates a new storage adapter wrapping the given client
    pub fn new(client: WebDavClient) -> Self {
        Self { client }
    }

    /// Returns a reference to the underlying client
    pub fn client(&self) -> &WebDavClient {
        &self.client
    }
}

#[async_trait]
impl IRemoteStorage for WebDavStorage {
    async fn exists(&self, path: &RemotePath) -> Result<bool, TransportError> {
        let target = format!("PROPFIND {path}");
        let request = self
            .client
            .request(self.client.propfind_method(), self.client.url_for(path, false))
            .header("Depth", "0")
            .header(header::CONTENT_TYPE, "application/xml; charset=utf-8")
            .body(PROPFIND_BODY);

        let response = self.client.send(request, &target).await?;
        match response.status() {
            StatusCode::OK | StatusCode::MULTI_STATUS => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(classify_status(status, &target)),
        }
    }

    async fn mkdir(&self, path: &RemotePath) -> Result<(), TransportError> {
        let target = format!("MKCOL {path}");
        let request = self
            .client
            .request(self.client.mkcol_method(), self.client.url_for(path, true));

        let response = self.client.send(request, &target).await?;
        match response.status() {
            StatusCode::CREATED | StatusCode::OK => Ok(()),
            StatusCode::METHOD_NOT_ALLOWED => {
                debug!(path = %path, "Collection already exists");
                Ok(())
            }
            status => Err(classify_status(status, &target)),
        }
    }

    async fn put(&self, local: &Path, remote: &RemotePath) -> Result<(), TransportError> {
        let target = format!("PUT {remote}");

        let file = tokio::fs::File::open(local)
            .await
            .map_err(|e| local_io_error(local, &e))?;
        let length = file
            .metadata()
            .await
            .map_err(|e| local_io_error(local, &e))?
            .len();

        let request = self
            .client
            .request(Method::PUT, self.client.url_for(remote, false))
            .header(header::CONTENT_LENGTH, length)
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(Body::from(file));

        let response = self.client.send(request, &target).await?;
        match response.status() {
            StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT => {
                debug!(local = %local.display(), remote = %remote, bytes = length, "Uploaded");
                Ok(())
            }
            status => Err(classify_status(status, &target)),
        }
    }

    async fn delete(&self, path: &RemotePath) -> Result<(), TransportError> {
        let target = format!("DELETE {path}");
        let request = self
            .client
            .request(Method::DELETE, self.client.url_for(path, false));

        let response = self.client.send(request, &target).await?;
        match response.status() {
            StatusCode::OK | StatusCode::ACCEPTED | StatusCode::NO_CONTENT => Ok(()),
            StatusCode::NOT_FOUND => {
                debug!(path = %path, "Delete target already absent");
                Ok(())
            }
            status => Err(classify_status(status, &target)),
        }
    }
}

fn local_io_error(local: &Path, err: &std::io::Error) -> TransportError {
    if err.kind() == std::io::ErrorKind::NotFound {
        TransportError::LocalFileMissing(local.to_path_buf())
    } else {
        TransportError::LocalIo {
            path: local.to_path_buf(),
            message: err.to_string(),
        }
    }
}
