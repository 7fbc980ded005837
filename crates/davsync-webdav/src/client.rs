//! WebDAV HTTP client
//!
//! Wraps `reqwest::Client` with basic authentication, a per-request timeout
//! and URL construction for remote paths under a fixed endpoint.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use davsync_webdav::client::{WebDavClient, WebDavConfig};
//!
//! # fn example() -> Result<(), davsync_webdav::WebDavError> {
//! let client = WebDavClient::new(WebDavConfig {
//!     endpoint: "https://cloud.example.com/remote.php/dav/files/alice".into(),
//!     username: Some("alice".into()),
//!     password: Some("secret".into()),
//!     timeout: Duration::from_secs(30),
//! })?;
//! # Ok(())
//! # }
//! ```

use std::{fmt, time::Duration};

use davsync_core::{config::RemoteConfig, domain::newtypes::RemotePath, ports::TransportError};
use reqwest::{Client, Method, RequestBuilder, Response};
use tracing::debug;
use url::Url;

use crate::{status::classify_request_error, WebDavError};

// ============================================================================
// WebDavConfig
// ============================================================================

/// Connection settings for a [`WebDavClient`]
#[derive(Clone)]
pub struct WebDavConfig {
    /// Endpoint URL; remote paths are appended to its path
    pub endpoint: String,
    /// Basic auth user
    pub username: Option<String>,
    /// Basic auth password
    pub password: Option<String>,
    /// Upper bound for a single request, including the body transfer
    pub timeout: Duration,
}

impl From<&RemoteConfig> for WebDavConfig {
    fn from(remote: &RemoteConfig) -> Self {
        Self {
            endpoint: remote.url.clone(),
            username: remote.username.clone(),
            password: remote.password.clone(),
            timeout: remote.timeout(),
        }
    }
}

impl fmt::Debug for WebDavConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebDavConfig")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ============================================================================
// WebDavClient
// ============================================================================

/// HTTP client for a single WebDAV endpoint
pub struct WebDavClient {
    /// The underlying HTTP client
    client: Client,
    /// Endpoint every remote path is resolved against
    endpoint: Url,
    username: Option<String>,
    password: Option<String>,
    /// `PROPFIND` extension method
    propfind: Method,
    /// `MKCOL` extension method
    mkcol: Method,
}

impl WebDavClient {
    /// Creates a client for the endpoint in `config`
    ///
    /// # Errors
    /// Returns [`WebDavError::InvalidUrl`] when the endpoint is not an
    /// http(s) URL that can carry a path.
    pub fn new(config: WebDavConfig) -> Result<Self, WebDavError> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| WebDavError::InvalidUrl(format!("{}: {e}", config.endpoint)))?;

        if !matches!(endpoint.scheme(), "http" | "https") || endpoint.cannot_be_a_base() {
            return Err(WebDavError::InvalidUrl(format!(
                "{}: expected an http(s) URL",
                config.endpoint
            )));
        }

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            username: config.username,
            password: config.password,
            propfind: extension_method("PROPFIND")?,
            mkcol: extension_method("MKCOL")?,
        })
    }

    /// The endpoint URL
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Resolves a remote path to a URL under the endpoint
    ///
    /// Segments are percent-encoded individually. Collection URLs get a
    /// trailing slash, which several servers require for `MKCOL`.
    pub fn url_for(&self, path: &RemotePath, collection: bool) -> Url {
        let mut url = self.endpoint.clone();
        // new() rejected cannot-be-a-base URLs, so this always succeeds
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(path.segments());
            if collection {
                segments.push("");
            }
        }
        url
    }

    /// Builds an authenticated request for `url`
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.username {
            Some(user) => builder.basic_auth(user, self.password.as_deref()),
            None => builder,
        }
    }

    /// The `PROPFIND` method
    pub fn propfind_method(&self) -> Method {
        self.propfind.clone()
    }

    /// The `MKCOL` method
    pub fn mkcol_method(&self) -> Method {
        self.mkcol.clone()
    }

    /// Sends a request, mapping client-side failures to [`TransportError`]
    ///
    /// Any HTTP status is returned as a response; interpreting it is up to
    /// the caller.
    pub async fn send(
        &self,
        builder: RequestBuilder,
        target: &str,
    ) -> Result<Response, TransportError> {
        debug!(target = %target, "Sending WebDAV request");
        let response = builder
            .send()
            .await
            .map_err(|e| classify_request_error(&e, target))?;
        debug!(target = %target, status = %response.status(), "WebDAV response");
        Ok(response)
    }
}

impl fmt::Debug for WebDavClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebDavClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

fn extension_method(name: &str) -> Result<Method, WebDavError> {
    Method::from_bytes(name.as_bytes()).map_err(|e| WebDavError::InvalidMethod(format!("{name}: {e}")))
}
