//! Adapter error types.
//!
//! Three families:
//! - [`RegistrationError`]: caller misconfiguration, raised when an endpoint is added.
//! - [`TransformError`]: a success/error transform refused to produce a response.
//!   Recovered by [`TransformError::recover`] using the `"<status> - <message>"`
//!   convention.
//! - [`AdapterError`]: fatal per-request failures (the execution payload could
//!   not be read or parsed). Rendered as a 502 with a JSON error body.

use crate::domain::types::RestResponse;
use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;

/// Machine-readable codes carried in fatal error bodies
pub mod codes {
    pub const EXECUTION_FAILED: &str = "execution_failed";
    pub const PAYLOAD_TOO_LARGE: &str = "payload_too_large";
    pub const MALFORMED_PAYLOAD: &str = "malformed_payload";
}

/// Separator of the `"<status> - <message>"` convention
pub const STATUS_SEPARATOR: &str = " - ";

/// Endpoint registration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    /// Path is empty or not absolute
    #[error("invalid endpoint path {0:?}: must be non-empty and start with '/'")]
    InvalidPath(String),

    /// Path collides with the execution route
    #[error("endpoint path {0:?} is reserved for query execution")]
    ReservedPath(String),

    /// Another endpoint already owns the path
    #[error("an endpoint is already registered on {0:?}")]
    DuplicatePath(String),
}

/// Failure raised by a success or error transform.
///
/// The description may follow the `"<status> - <message>"` convention, e.g.
/// `"404 - No presidents found"`, in which case the status is recovered when
/// the failure is turned into a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformError {
    message: String,
}

impl TransformError {
    /// Create a transform error from a free-form description
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Create a transform error that carries an HTTP status
    pub fn with_status(status: StatusCode, message: impl fmt::Display) -> Self {
        Self::new(format!(
            "{}{}{}",
            status.as_u16(),
            STATUS_SEPARATOR,
            message
        ))
    }

    /// Full description
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Split the description into a status and a message.
    ///
    /// Falls back to 500 with the whole description when the prefix is not a
    /// valid three-digit status code.
    pub fn status_and_message(&self) -> (StatusCode, &str) {
        if let Some((prefix, rest)) = self.message.split_once(STATUS_SEPARATOR) {
            let prefix = prefix.trim();
            if prefix.len() == 3 && prefix.bytes().all(|b| b.is_ascii_digit()) {
                if let Some(status) = prefix
                    .parse::<u16>()
                    .ok()
                    .and_then(|code| StatusCode::from_u16(code).ok())
                {
                    return (status, rest);
                }
            }
        }

        (StatusCode::INTERNAL_SERVER_ERROR, self.message.as_str())
    }

    /// Turn the failure into the response that is emitted in its place
    pub fn recover(&self) -> RestResponse {
        let (status, message) = self.status_and_message();
        RestResponse::text(status, message)
    }
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TransformError {}

impl From<serde_json::Error> for TransformError {
    fn from(e: serde_json::Error) -> Self {
        TransformError::with_status(StatusCode::INTERNAL_SERVER_ERROR, e)
    }
}

/// Fatal per-request errors
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The execution response body could not be read
    #[error("execution response could not be read: {0}")]
    Execution(String),

    /// The execution response body exceeded the configured limit
    #[error("execution payload exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// The execution response body is not valid JSON
    #[error("execution payload is not valid JSON: {0}")]
    MalformedPayload(#[from] serde_json::Error),
}

impl AdapterError {
    /// Machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AdapterError::Execution(_) => codes::EXECUTION_FAILED,
            AdapterError::PayloadTooLarge { .. } => codes::PAYLOAD_TOO_LARGE,
            AdapterError::MalformedPayload(_) => codes::MALFORMED_PAYLOAD,
        }
    }

    /// Status emitted to the client
    pub fn status(&self) -> StatusCode {
        StatusCode::BAD_GATEWAY
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    code: &'a str,
    message: String,
}

impl IntoResponse for AdapterError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code(),
                message: self.to_string(),
            },
        };

        let mut response =
            Response::new(Body::from(serde_json::to_vec(&body).unwrap_or_default()));
        *response.status_mut() = self.status();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        response
    }
}

/// Result type for per-request operations
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Server-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] crate::domain::config::ConfigError),

    /// Listener bind error
    #[error("server bind error: {0}")]
    Bind(#[source] std::io::Error),

    /// Serving failed
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    /// `serve` called before `bind`
    #[error("server is not bound")]
    NotBound,
}
