//! Adapter configuration.
//!
//! [`AdapterConfig`] holds the caller's classification and error callbacks.
//! [`AdapterSettings`] and [`ServerConfig`] are plain serde settings with
//! defaults and validation.

use crate::domain::endpoint::{ErrorPredicate, ResponseTransform};
use crate::domain::error::TransformError;
use crate::domain::types::{ExecutionResult, RestResponse};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

/// Error field conventionally used to carry the intended REST response
pub const DEFAULT_SENTINEL_FIELD: &str = "__http_secret__";

/// Default execution route
pub const DEFAULT_EXECUTION_PATH: &str = "/graphql";

/// Adapter-wide callbacks, shared read-only by every endpoint
#[derive(Clone)]
pub struct AdapterConfig {
    is_error: ErrorPredicate,
    transform_error: ResponseTransform,
}

impl AdapterConfig {
    pub fn new<P, T>(is_error: P, transform_error: T) -> Self
    where
        P: Fn(&ExecutionResult) -> bool + Send + Sync + 'static,
        T: Fn(&ExecutionResult) -> Result<RestResponse, TransformError> + Send + Sync + 'static,
    {
        Self {
            is_error: Arc::new(is_error),
            transform_error: Arc::new(transform_error),
        }
    }

    /// Sentinel convention: a result is an error when it carries `errors`,
    /// and the first error's `field` holds the `{status, body}` to emit.
    pub fn sentinel(field: impl Into<String>) -> Self {
        let field: Arc<str> = Arc::from(field.into());
        Self::new(ExecutionResult::has_errors, move |result: &ExecutionResult| {
            extract_sentinel(result, &field)
        })
    }

    pub fn is_error(&self, result: &ExecutionResult) -> bool {
        (self.is_error)(result)
    }

    pub fn transform_error(
        &self,
        result: &ExecutionResult,
    ) -> Result<RestResponse, TransformError> {
        (self.transform_error)(result)
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self::sentinel(DEFAULT_SENTINEL_FIELD)
    }
}

impl fmt::Debug for AdapterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterConfig").finish_non_exhaustive()
    }
}

fn extract_sentinel(result: &ExecutionResult, field: &str) -> Result<RestResponse, TransformError> {
    let sentinel = result
        .first_error()
        .and_then(|error| error.get(field))
        .ok_or_else(|| {
            TransformError::with_status(
                StatusCode::INTERNAL_SERVER_ERROR,
                format_args!("execution error carries no {} field", field),
            )
        })?;

    Ok(serde_json::from_value(sentinel.clone())?)
}

/// Per-adapter settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterSettings {
    /// Route of the execution layer that rewritten requests target
    pub execution_path: String,
    /// Max execution payload size in bytes (default: 10MB)
    pub max_payload_size: usize,
    /// Forward inbound headers to the execution layer
    pub forward_headers: bool,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            execution_path: DEFAULT_EXECUTION_PATH.to_string(),
            max_payload_size: 10 * 1024 * 1024, // 10MB
            forward_headers: true,
        }
    }
}

impl AdapterSettings {
    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.execution_path.starts_with('/') {
            return Err(ConfigError::InvalidExecutionPath(
                self.execution_path.clone(),
            ));
        }

        if self.max_payload_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_payload_size cannot be 0".into(),
            ));
        }

        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// JSON formatted logs
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 8080, 0 picks a free port)
    pub port: u16,
    /// Logging setup
    pub logging: LoggingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8080,
            logging: LoggingConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `REST_ADAPTER_HOST`: Bind address (default: 0.0.0.0)
    /// - `REST_ADAPTER_PORT`: Port (default: 8080)
    /// - `REST_ADAPTER_LOG_LEVEL`: Log filter (default: info)
    /// - `REST_ADAPTER_JSON_LOGS`: JSON logs (default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = match env::var("REST_ADAPTER_HOST") {
            Ok(value) => value
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("REST_ADAPTER_HOST={}", value)))?,
            Err(_) => defaults.host,
        };

        let port = match env::var("REST_ADAPTER_PORT") {
            Ok(value) => value
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("REST_ADAPTER_PORT={}", value)))?,
            Err(_) => defaults.port,
        };

        let logging = LoggingConfig {
            level: env::var("REST_ADAPTER_LOG_LEVEL").unwrap_or(defaults.logging.level),
            json: env::var("REST_ADAPTER_JSON_LOGS")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.logging.json),
        };

        Ok(Self {
            host,
            port,
            logging,
        })
    }

    /// Get server bind address
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Execution route is not an absolute path
    #[error("invalid execution path {0:?}: must start with '/'")]
    InvalidExecutionPath(String),
    /// Invalid size or count limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
