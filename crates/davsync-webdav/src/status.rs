//! HTTP status and client error classification
//!
//! Every non-success answer from the server ends up as a
//! [`TransportError`] here, which decides whether the orchestrator will
//! retry it.
//!
//! | Status            | Error             | Retried |
//! |-------------------|-------------------|---------|
//! | 400, 414          | `InvalidPath`     | no      |
//! | 401               | `Unauthorized`    | no      |
//! | 403               | `Forbidden`       | no      |
//! | 408               | `Timeout`         | yes     |
//! | 409               | `Conflict`        | yes     |
//! | 423, 429          | `TooManyRequests` | yes     |
//! | 5xx               | `Server`          | yes     |
//! | anything else     | `UnexpectedStatus`| no      |

use davsync_core::ports::TransportError;
use reqwest::StatusCode;

/// Maps an unexpected HTTP status to a [`TransportError`]
///
/// `target` names the request (e.g. `"PUT /backup/a.txt"`) and ends up in
/// the error message.
pub fn classify_status(status: StatusCode, target: &str) -> TransportError {
    let message = format!(
        "{target}: {}",
        status.canonical_reason().unwrap_or("unknown status")
    );

    match status.as_u16() {
        400 | 414 => TransportError::InvalidPath(message),
        401 => TransportError::Unauthorized(message),
        403 => TransportError::Forbidden(message),
        408 => TransportError::Timeout(message),
        409 => TransportError::Conflict(message),
        423 | 429 => TransportError::TooManyRequests(message),
        code @ 500..=599 => TransportError::Server {
            status: code,
            message,
        },
        code => TransportError::UnexpectedStatus {
            status: code,
            message,
        },
    }
}

/// Maps a client-side `reqwest` failure to a [`TransportError`]
pub fn classify_request_error(err: &reqwest::Error, target: &str) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(format!("{target}: {err}"))
    } else if let Some(status) = err.status() {
        classify_status(status, target)
    } else {
        // Connect, request and body errors are all connection-level
        TransportError::Network(format!("{target}: {err}"))
    }
}
