//! Middleware stack for the adapter router.
//!
//! Layer order: Request → Tracing → CatchPanic → Endpoint handler

pub mod metrics;
pub mod tracing;

pub use metrics::{AdapterMetrics, RequestOutcome, RequestTimer};
pub use tracing::TracingLayer;
