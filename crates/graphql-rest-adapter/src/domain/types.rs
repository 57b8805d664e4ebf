//! Per-request value types: the execution payload, its classification and the
//! REST response it is rewritten into.

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::ops::Index;

/// Content type of structured bodies
pub const JSON_CONTENT_TYPE: &str = "application/json";
/// Content type of raw string bodies
pub const TEXT_CONTENT_TYPE: &str = "text/html";

/// Body sent to the execution route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPayload {
    pub query: String,
}

impl QueryPayload {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }
}

/// Parsed JSON payload written by the execution layer.
///
/// Indexing by field name mirrors `serde_json::Value`: missing fields yield
/// `Value::Null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionResult(Value);

impl ExecutionResult {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        self.0
    }

    /// Top-level field of the payload
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// The `data` envelope, when the execution layer uses one
    pub fn data(&self) -> Option<&Value> {
        self.field("data").filter(|v| !v.is_null())
    }

    /// True when the payload carries a non-null `errors` field
    pub fn has_errors(&self) -> bool {
        matches!(self.field("errors"), Some(errors) if !errors.is_null())
    }

    /// Error objects in order; empty when absent or not a list
    pub fn errors(&self) -> &[Value] {
        self.field("errors")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The error inspected by convention
    pub fn first_error(&self) -> Option<&Value> {
        self.errors().first()
    }
}

impl From<Value> for ExecutionResult {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl Index<&str> for ExecutionResult {
    type Output = Value;

    fn index(&self, field: &str) -> &Value {
        &self.0[field]
    }
}

/// Classification of an execution result
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(ExecutionResult),
    Failure(ExecutionResult),
}

impl Outcome {
    /// Classify once with the caller's predicate
    pub fn classify<F>(result: ExecutionResult, is_error: F) -> Self
    where
        F: FnOnce(&ExecutionResult) -> bool,
    {
        if is_error(&result) {
            Outcome::Failure(result)
        } else {
            Outcome::Success(result)
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    pub fn result(&self) -> &ExecutionResult {
        match self {
            Outcome::Success(result) | Outcome::Failure(result) => result,
        }
    }
}

/// REST response body
#[derive(Debug, Clone, PartialEq)]
pub enum RestBody {
    /// Serialized as JSON
    Json(Value),
    /// Written verbatim
    Text(String),
}

impl RestBody {
    pub fn content_type(&self) -> &'static str {
        match self {
            RestBody::Json(_) => JSON_CONTENT_TYPE,
            RestBody::Text(_) => TEXT_CONTENT_TYPE,
        }
    }

    /// Bytes written to the client
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            RestBody::Json(value) => serde_json::to_vec(&value).unwrap_or_default(),
            RestBody::Text(text) => text.into_bytes(),
        }
    }
}

/// JSON strings become raw text; every other value stays structured.
impl From<Value> for RestBody {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => RestBody::Text(text),
            other => RestBody::Json(other),
        }
    }
}

impl From<String> for RestBody {
    fn from(text: String) -> Self {
        RestBody::Text(text)
    }
}

impl From<&str> for RestBody {
    fn from(text: &str) -> Self {
        RestBody::Text(text.to_string())
    }
}

impl Serialize for RestBody {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            RestBody::Json(value) => value.serialize(serializer),
            RestBody::Text(text) => serializer.serialize_str(text),
        }
    }
}

impl<'de> Deserialize<'de> for RestBody {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(RestBody::from)
    }
}

/// Response descriptor produced by a transform
#[derive(Debug, Clone, PartialEq)]
pub struct RestResponse {
    pub status: StatusCode,
    pub body: RestBody,
}

impl RestResponse {
    pub fn new(status: StatusCode, body: impl Into<RestBody>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Structured body, always emitted as JSON (strings included)
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body: RestBody::Json(body),
        }
    }

    /// Raw body, emitted verbatim
    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: RestBody::Text(body.into()),
        }
    }

    pub fn ok(body: impl Into<RestBody>) -> Self {
        Self::new(StatusCode::OK, body)
    }
}

impl Serialize for RestResponse {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("RestResponse", 2)?;
        state.serialize_field("status", &self.status.as_u16())?;
        state.serialize_field("body", &self.body)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for RestResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ResponseHelper {
            status: u16,
            #[serde(default)]
            body: Value,
        }

        let helper = ResponseHelper::deserialize(deserializer)?;
        let status = StatusCode::from_u16(helper.status).map_err(serde::de::Error::custom)?;
        Ok(RestResponse::new(status, helper.body))
    }
}

impl IntoResponse for RestResponse {
    fn into_response(self) -> Response {
        let content_type = self.body.content_type();
        let mut response = Response::new(Body::from(self.body.into_bytes()));
        *response.status_mut() = self.status;
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        response
    }
}
