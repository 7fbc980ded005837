//! Integration tests for davsync-webdav
//!
//! Uses wiremock to simulate a WebDAV server and verifies the request
//! shapes and status interpretation of `WebDavStorage`.

mod common;

mod test_errors;
