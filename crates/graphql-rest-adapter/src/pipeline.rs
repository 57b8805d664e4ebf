//! Request translation pipeline.
//!
//! Each served request walks these steps exactly once:
//!
//! ```text
//! RECEIVED → REWRITTEN → EXECUTING → INTERCEPTED → CLASSIFIED → TRANSFORMED → EMITTED
//!                                          │
//!                                          └──────────────→ FAILED (502)
//! ```
//!
//! [`rewrite_request`] builds the execution call, [`intercept`] captures the
//! execution layer's payload instead of letting it reach the client, and
//! [`translate`] parses, classifies and transforms it.

use crate::domain::config::AdapterConfig;
use crate::domain::endpoint::EndpointDefinition;
use crate::domain::error::{AdapterError, AdapterResult, TransformError};
use crate::domain::types::{ExecutionResult, Outcome, QueryPayload, RestResponse, JSON_CONTENT_TYPE};
use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Method, Request, Uri},
    response::Response,
};
use bytes::{Bytes, BytesMut};
use futures::StreamExt;

/// Inbound headers never forwarded to the execution service: body framing,
/// hop-by-hop headers, and content negotiation the payload parser cannot honour
const STRIPPED_HEADERS: [header::HeaderName; 8] = [
    header::CONTENT_LENGTH,
    header::TRANSFER_ENCODING,
    header::ACCEPT_ENCODING,
    header::CONNECTION,
    header::TE,
    header::UPGRADE,
    header::TRAILER,
    header::PROXY_AUTHORIZATION,
];

/// Build the execution request carrying `{"query": ...}`
pub fn rewrite_request(
    execution_uri: &Uri,
    query: String,
    inbound_headers: Option<&HeaderMap>,
) -> Request<Body> {
    let payload = serde_json::to_vec(&QueryPayload::new(query)).unwrap_or_default();

    let mut request = Request::new(Body::from(payload));
    *request.method_mut() = Method::POST;
    *request.uri_mut() = execution_uri.clone();

    if let Some(inbound) = inbound_headers {
        let headers = request.headers_mut();
        headers.clone_from(inbound);
        for name in &STRIPPED_HEADERS {
            headers.remove(name);
        }
    }
    request.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(JSON_CONTENT_TYPE),
    );

    request
}

/// Capture the execution layer's payload, bounded by `limit` bytes.
///
/// The whole body is treated as the single write the execution layer makes.
pub async fn intercept(response: Response, limit: usize) -> AdapterResult<Bytes> {
    let mut stream = response.into_body().into_data_stream();
    let mut payload = BytesMut::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| AdapterError::Execution(e.to_string()))?;
        if payload.len() + chunk.len() > limit {
            return Err(AdapterError::PayloadTooLarge { limit });
        }
        payload.extend_from_slice(&chunk);
    }

    Ok(payload.freeze())
}

/// Parse the captured payload
pub fn parse_payload(payload: &[u8]) -> AdapterResult<ExecutionResult> {
    let value: serde_json::Value = serde_json::from_slice(payload)?;
    Ok(ExecutionResult::new(value))
}

/// Run the transform matching the outcome
pub fn transform(
    config: &AdapterConfig,
    endpoint: &EndpointDefinition,
    outcome: &Outcome,
) -> Result<RestResponse, TransformError> {
    match outcome {
        Outcome::Failure(result) => config.transform_error(result),
        Outcome::Success(result) => endpoint.transform_success(result),
    }
}

/// Result of translating one payload
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    /// The execution result was classified as an error
    pub failure: bool,
    /// Response to emit
    pub response: RestResponse,
    /// Transform failure that `response` was recovered from
    pub recovered_from: Option<TransformError>,
}

/// Parse, classify and transform a captured payload.
///
/// Transform failures are recovered through [`TransformError::recover`];
/// only an unparseable payload is fatal.
pub fn translate(
    config: &AdapterConfig,
    endpoint: &EndpointDefinition,
    payload: &[u8],
) -> AdapterResult<Translation> {
    let result = parse_payload(payload)?;
    let outcome = Outcome::classify(result, |r| config.is_error(r));

    let translation = match transform(config, endpoint, &outcome) {
        Ok(response) => Translation {
            failure: outcome.is_failure(),
            response,
            recovered_from: None,
        },
        Err(err) => Translation {
            failure: outcome.is_failure(),
            response: err.recover(),
            recovered_from: Some(err),
        },
    };

    Ok(translation)
}
