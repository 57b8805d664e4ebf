//! GraphQL REST adapter - serve REST endpoints backed by a GraphQL executor.
//!
//! Each registered endpoint owns a fixed (or request-derived) GraphQL query.
//! A `GET` on the endpoint is rewritten into a query execution, and the
//! execution result is translated into an ordinary REST response: status code,
//! content type and body chosen by the endpoint's transforms.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        REST ADAPTER                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │   GET /presidents           GET /presidents/:id              │
//! │          │                          │                        │
//! │  ┌───────┴──────────────────────────┴───────┐                │
//! │  │        Tracing → CatchPanic              │                │
//! │  └───────────────────┬──────────────────────┘                │
//! │                      │  rewrite: POST /graphql {"query"}     │
//! │  ┌───────────────────┴──────────────────────┐                │
//! │  │          Execution service               │◄── any tower   │
//! │  └───────────────────┬──────────────────────┘    Service     │
//! │                      │  intercept payload                    │
//! │  ┌───────────────────┴──────────────────────┐                │
//! │  │  parse → classify → transform → emit     │                │
//! │  └──────────────────────────────────────────┘                │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Errors
//!
//! GraphQL errors carry their HTTP response in a sentinel field of the first
//! error (`__http_secret__` by default): `{"status": 404, "body": "..."}`.
//! A transform that fails with `"<status> - <message>"` is answered with that
//! status and message. An unparseable payload yields `502 Bad Gateway`.
//!
//! # Usage
//!
//! ```ignore
//! use graphql_rest_adapter::{AdapterConfig, EndpointDefinition, RestAdapter, RestResponse};
//!
//! let mut adapter = RestAdapter::new(AdapterConfig::default());
//! adapter.add_endpoint(EndpointDefinition::with_query(
//!     "/presidents",
//!     "query { presidents { name } }",
//!     |result| Ok(RestResponse::ok(result["presidents"].clone())),
//! ))?;
//!
//! let app = adapter.mount(graphql_app);
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapter;
pub mod domain;
pub mod middleware;
pub mod pipeline;
pub mod service;
pub mod telemetry;

// Re-exports for public API
pub use adapter::RestAdapter;
pub use domain::config::{AdapterConfig, AdapterSettings, ConfigError, LoggingConfig, ServerConfig};
pub use domain::endpoint::{EndpointDefinition, InboundRequest};
pub use domain::error::{
    AdapterError, AdapterResult, RegistrationError, ServerError, TransformError,
};
pub use domain::types::*;
pub use middleware::AdapterMetrics;
pub use service::{AdapterServer, ShutdownHandle};
pub use telemetry::{init_logging, TelemetryError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
