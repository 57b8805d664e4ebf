//! Endpoint definitions and the inbound request view handed to query builders.

use crate::domain::error::TransformError;
use crate::domain::types::{ExecutionResult, RestResponse};
use axum::http::{HeaderMap, Method, Uri};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Derives the query string from the inbound request
pub type QueryBuilder = Arc<dyn Fn(&InboundRequest) -> String + Send + Sync>;

/// Maps an execution result to a REST response
pub type ResponseTransform =
    Arc<dyn Fn(&ExecutionResult) -> Result<RestResponse, TransformError> + Send + Sync>;

/// Decides whether an execution result is an error
pub type ErrorPredicate = Arc<dyn Fn(&ExecutionResult) -> bool + Send + Sync>;

/// Read-only view of the GET request being served
#[derive(Debug, Clone)]
pub struct InboundRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    path_params: HashMap<String, String>,
    query_params: HashMap<String, String>,
}

impl InboundRequest {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        Self {
            method,
            uri,
            headers,
            path_params: HashMap::new(),
            query_params: HashMap::new(),
        }
    }

    /// Attach the parameters captured by the route pattern
    pub fn with_path_params(mut self, params: HashMap<String, String>) -> Self {
        self.path_params = params;
        self
    }

    /// Attach the decoded query-string parameters
    pub fn with_query_params(mut self, params: HashMap<String, String>) -> Self {
        self.query_params = params;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value, if present and visible ASCII
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    pub fn path_params(&self) -> &HashMap<String, String> {
        &self.path_params
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query_params
    }
}

/// One REST route served by one query
#[derive(Clone)]
pub struct EndpointDefinition {
    path: String,
    query_builder: QueryBuilder,
    success_transform: ResponseTransform,
}

impl EndpointDefinition {
    pub fn new<Q, T>(path: impl Into<String>, query_builder: Q, success_transform: T) -> Self
    where
        Q: Fn(&InboundRequest) -> String + Send + Sync + 'static,
        T: Fn(&ExecutionResult) -> Result<RestResponse, TransformError> + Send + Sync + 'static,
    {
        Self {
            path: path.into(),
            query_builder: Arc::new(query_builder),
            success_transform: Arc::new(success_transform),
        }
    }

    /// Endpoint whose query does not depend on the request
    pub fn with_query<T>(
        path: impl Into<String>,
        query: impl Into<String>,
        success_transform: T,
    ) -> Self
    where
        T: Fn(&ExecutionResult) -> Result<RestResponse, TransformError> + Send + Sync + 'static,
    {
        let query: Arc<str> = Arc::from(query.into());
        Self::new(path, move |_: &InboundRequest| query.to_string(), success_transform)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn build_query(&self, request: &InboundRequest) -> String {
        (self.query_builder)(request)
    }

    pub fn transform_success(
        &self,
        result: &ExecutionResult,
    ) -> Result<RestResponse, TransformError> {
        (self.success_transform)(result)
    }
}

impl fmt::Debug for EndpointDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointDefinition")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
