//! Error classification against a live HTTP server

use std::time::Duration;

use davsync_core::ports::{IRemoteStorage, TransportError};
use wiremock::{
    matchers::method,
    Mock, MockServer, ResponseTemplate,
};

use crate::common::{self, remote};

#[tokio::test]
async fn test_unauthorized_is_permanent() {
    let (server, storage) = common::setup_dav_mock().await;

    Mock::given(method("PROPFIND"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = storage.exists(&remote("/backup")).await.unwrap_err();
    assert!(matches!(err, TransportError::Unauthorized(_)));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_forbidden_put_is_permanent() {
    let (server, storage) = common::setup_dav_mock().await;
    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("a.txt");
    std::fs::write(&local, b"x").unwrap();

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = storage.put(&local, &remote("/backup/a.txt")).await.unwrap_err();
    assert!(matches!(err, TransportError::Forbidden(_)));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_service_unavailable_is_transient() {
    let (server, storage) = common::setup_dav_mock().await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = storage.delete(&remote("/backup/a.txt")).await.unwrap_err();
    assert!(matches!(err, TransportError::Server { status: 503, .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_insufficient_storage_is_transient() {
    let (server, storage) = common::setup_dav_mock().await;
    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("big.bin");
    std::fs::write(&local, vec![0u8; 1024]).unwrap();

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(507))
        .mount(&server)
        .await;

    let err = storage.put(&local, &remote("/backup/big.bin")).await.unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    let storage = common::storage_for(&server, Duration::from_millis(100));

    Mock::given(method("PROPFIND"))
        .respond_with(ResponseTemplate::new(207).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let err = storage.exists(&remote("/backup")).await.unwrap_err();
    assert!(matches!(err, TransportError::Timeout(_)), "got {err:?}");
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    // Reserve a port, then free it so nothing is listening there
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let storage = common::storage_at(&format!("http://127.0.0.1:{port}/dav"), Duration::from_secs(2));

    let err = storage.exists(&remote("/backup")).await.unwrap_err();
    assert!(matches!(err, TransportError::Network(_)), "got {err:?}");
    assert!(err.is_transient());
}
