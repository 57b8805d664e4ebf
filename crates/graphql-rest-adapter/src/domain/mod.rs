//! Domain types for the adapter.
//!
//! Endpoint definitions, adapter configuration, per-request value types and
//! error handling. Nothing here touches the network.

pub mod config;
pub mod correlation;
pub mod endpoint;
pub mod error;
pub mod types;

// Re-exports for convenience
pub use config::{AdapterConfig, AdapterSettings, ConfigError, LoggingConfig, ServerConfig};
pub use correlation::CorrelationId;
pub use endpoint::{
    EndpointDefinition, ErrorPredicate, InboundRequest, QueryBuilder, ResponseTransform,
};
pub use error::{AdapterError, AdapterResult, RegistrationError, ServerError, TransformError};
pub use types::*;
