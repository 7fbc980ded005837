//! Shared test helpers for WebDAV integration tests
//!
//! Each helper starts a wiremock server and returns a `WebDavStorage`
//! whose endpoint points at `/dav` on that server.

use std::time::Duration;

use davsync_core::domain::newtypes::RemotePath;
use davsync_webdav::{WebDavClient, WebDavConfig, WebDavStorage};
use wiremock::MockServer;

pub const USERNAME: &str = "alice";
pub const PASSWORD: &str = "secret";

/// Starts a mock server and returns it with a storage adapter using basic auth
pub async fn setup_dav_mock() -> (MockServer, WebDavStorage) {
    let server = MockServer::start().await;
    let storage = storage_for(&server, Duration::from_secs(5));
    (server, storage)
}

/// Builds a storage adapter for `server` with the given request timeout
pub fn storage_for(server: &MockServer, timeout: Duration) -> WebDavStorage {
    storage_at(&format!("{}/dav", server.uri()), timeout)
}

/// Builds a storage adapter for an arbitrary endpoint
pub fn storage_at(endpoint: &str, timeout: Duration) -> WebDavStorage {
    let client = WebDavClient::new(WebDavConfig {
        endpoint: endpoint.to_string(),
        username: Some(USERNAME.to_string()),
        password: Some(PASSWORD.to_string()),
        timeout,
    })
    .expect("client should build");
    WebDavStorage::new(client)
}

pub fn remote(path: &str) -> RemotePath {
    path.parse().expect("valid remote path")
}
