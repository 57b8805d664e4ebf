//! REST adapter: endpoint registration and router assembly.
//!
//! Every registered endpoint becomes a GET route. A request to that route is
//! rewritten into `POST <execution_path>` with `{"query": ...}`, sent to the
//! execution service, and the execution payload is translated into the REST
//! response that the client actually receives.

use crate::domain::config::{
    AdapterConfig, AdapterSettings, ConfigError, DEFAULT_EXECUTION_PATH,
};
use crate::domain::correlation::CorrelationId;
use crate::domain::endpoint::{EndpointDefinition, InboundRequest};
use crate::domain::error::RegistrationError;
use crate::middleware::{AdapterMetrics, RequestOutcome, RequestTimer, TracingLayer};
use crate::pipeline::{intercept, rewrite_request, translate};
use axum::{
    body::Body,
    extract::{Path, Query, Request},
    http::Uri,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use tower::{Service, ServiceExt};
use tower_http::catch_panic::CatchPanicLayer;
use tracing::{debug, warn};

/// Builds REST routes on top of a query execution service
pub struct RestAdapter {
    config: Arc<AdapterConfig>,
    settings: Arc<AdapterSettings>,
    execution_uri: Uri,
    endpoints: Vec<EndpointDefinition>,
    metrics: Arc<AdapterMetrics>,
}

impl RestAdapter {
    /// Create an adapter with default settings
    pub fn new(config: AdapterConfig) -> Self {
        Self {
            config: Arc::new(config),
            settings: Arc::new(AdapterSettings::default()),
            execution_uri: Uri::from_static(DEFAULT_EXECUTION_PATH),
            endpoints: Vec::new(),
            metrics: Arc::new(AdapterMetrics::new()),
        }
    }

    /// Create an adapter with explicit settings
    pub fn with_settings(
        config: AdapterConfig,
        settings: AdapterSettings,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        let execution_uri = settings
            .execution_path
            .parse::<Uri>()
            .map_err(|_| ConfigError::InvalidExecutionPath(settings.execution_path.clone()))?;

        Ok(Self {
            config: Arc::new(config),
            settings: Arc::new(settings),
            execution_uri,
            endpoints: Vec::new(),
            metrics: Arc::new(AdapterMetrics::new()),
        })
    }

    pub fn settings(&self) -> &AdapterSettings {
        &self.settings
    }

    /// Shared metrics, updated by every routed request
    pub fn metrics(&self) -> Arc<AdapterMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Register an endpoint.
    ///
    /// Rejects malformed paths, patterns that match the execution path, and
    /// patterns the router could not hold next to an existing endpoint.
    pub fn add_endpoint(&mut self, endpoint: EndpointDefinition) -> Result<(), RegistrationError> {
        let path = endpoint.path();
        validate_path(path)?;

        if pattern_matches(path, &self.settings.execution_path) {
            return Err(RegistrationError::ReservedPath(path.to_string()));
        }

        if self.endpoints.iter().any(|e| routes_conflict(e.path(), path)) {
            return Err(RegistrationError::DuplicatePath(path.to_string()));
        }

        debug!(path, "endpoint registered");
        self.endpoints.push(endpoint);
        Ok(())
    }

    /// Deregister the endpoint on `path`
    pub fn remove_endpoint(&mut self, path: &str) -> Option<EndpointDefinition> {
        let index = self.endpoints.iter().position(|e| e.path() == path)?;
        debug!(path, "endpoint removed");
        Some(self.endpoints.remove(index))
    }

    pub fn endpoints(&self) -> &[EndpointDefinition] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Build the REST router. Rewritten requests are sent to `executor`.
    pub fn into_router<S>(self, executor: S) -> Router
    where
        S: Service<Request<Body>, Response = Response, Error = Infallible>
            + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send,
    {
        let state = Arc::new(HandlerState {
            config: self.config,
            settings: self.settings,
            execution_uri: self.execution_uri,
            metrics: self.metrics,
            executor,
        });

        let mut router = Router::new();
        for endpoint in self.endpoints {
            let path = endpoint.path().to_string();
            let endpoint = Arc::new(endpoint);
            let state = Arc::clone(&state);

            router = router.route(
                &path,
                get(
                    move |path_params: Option<Path<HashMap<String, String>>>,
                          query_params: Option<Query<HashMap<String, String>>>,
                          request: Request| {
                        let state = Arc::clone(&state);
                        let endpoint = Arc::clone(&endpoint);
                        async move {
                            let (parts, _body) = request.into_parts();
                            let request_id = parts.extensions.get::<CorrelationId>().copied();
                            let path_params = path_params.map(|Path(p)| p).unwrap_or_default();
                            let query_params = query_params.map(|Query(q)| q).unwrap_or_default();
                            let inbound =
                                InboundRequest::new(parts.method, parts.uri, parts.headers)
                                    .with_path_params(path_params)
                                    .with_query_params(query_params);

                            serve_endpoint(&state, &endpoint, inbound, request_id).await
                        }
                    },
                ),
            );
        }

        router
            .layer(CatchPanicLayer::new())
            .layer(TracingLayer::new())
    }

    /// Serve the registered endpoints in front of `app`.
    ///
    /// `app` executes the rewritten queries on its execution route and keeps
    /// answering every request that no endpoint pattern matches.
    pub fn mount(self, app: Router) -> Router {
        self.into_router(app.clone()).fallback_service(app)
    }
}

/// Per-router state shared by every endpoint handler
struct HandlerState<S> {
    config: Arc<AdapterConfig>,
    settings: Arc<AdapterSettings>,
    execution_uri: Uri,
    metrics: Arc<AdapterMetrics>,
    executor: S,
}

async fn serve_endpoint<S>(
    state: &HandlerState<S>,
    endpoint: &EndpointDefinition,
    inbound: InboundRequest,
    request_id: Option<CorrelationId>,
) -> Response
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send,
{
    let timer = RequestTimer::new(Arc::clone(&state.metrics));
    let path = endpoint.path();

    let query = endpoint.build_query(&inbound);
    let forwarded = state.settings.forward_headers.then(|| inbound.headers());
    let execution_request = rewrite_request(&state.execution_uri, query, forwarded);
    debug!(endpoint = path, request_id = ?request_id, "request rewritten");

    let execution_response = match state.executor.clone().oneshot(execution_request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };
    debug!(
        endpoint = path,
        upstream_status = %execution_response.status(),
        "execution payload intercepted"
    );

    let translation = match intercept(execution_response, state.settings.max_payload_size)
        .await
        .and_then(|payload| translate(&state.config, endpoint, &payload))
    {
        Ok(translation) => translation,
        Err(err) => {
            warn!(endpoint = path, code = err.code(), error = %err, "request failed");
            timer.finish(RequestOutcome::Fatal);
            return err.into_response();
        }
    };

    let outcome = if let Some(err) = &translation.recovered_from {
        warn!(endpoint = path, error = %err, "transform failed, recovered");
        RequestOutcome::TransformRecovered
    } else if translation.failure {
        RequestOutcome::UpstreamError
    } else {
        RequestOutcome::Success
    };
    debug!(
        endpoint = path,
        status = %translation.response.status,
        failure = translation.failure,
        "response emitted"
    );

    timer.finish(outcome);
    translation.response.into_response()
}

/// Check route syntax up front so bad patterns fail at registration.
///
/// Parameters (`:name`) and the catch-all (`*name`) must span a whole segment;
/// the catch-all is only allowed last.
fn validate_path(path: &str) -> Result<(), RegistrationError> {
    let invalid = || RegistrationError::InvalidPath(path.to_string());

    if !path.starts_with('/') {
        return Err(invalid());
    }

    let segments: Vec<&str> = path[1..].split('/').collect();
    for (i, segment) in segments.iter().enumerate() {
        let mut chars = segment.chars();
        let first = chars.next();
        if chars.any(|c| c == ':' || c == '*') {
            return Err(invalid());
        }
        match first {
            Some(':') if segment.len() == 1 => return Err(invalid()),
            Some('*') if segment.len() == 1 || i + 1 != segments.len() => return Err(invalid()),
            _ => {}
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Static(&'a str),
    Param,
    CatchAll,
}

fn segments(pattern: &str) -> impl Iterator<Item = Segment<'_>> {
    pattern.split('/').skip(1).map(|segment| match segment.chars().next() {
        Some(':') => Segment::Param,
        Some('*') => Segment::CatchAll,
        _ => Segment::Static(segment),
    })
}

/// Whether two patterns cannot be routed side by side.
///
/// Identical shapes conflict, and so does a catch-all sharing its position
/// with any other segment. A static segment next to a parameter is fine,
/// statics win.
fn routes_conflict(a: &str, b: &str) -> bool {
    let (mut a, mut b) = (segments(a), segments(b));
    loop {
        match (a.next(), b.next()) {
            (None, None) => return true,
            (None, Some(_)) | (Some(_), None) => return false,
            (Some(Segment::CatchAll), Some(_)) | (Some(_), Some(Segment::CatchAll)) => return true,
            (Some(Segment::Param), Some(Segment::Param)) => {}
            (Some(Segment::Static(x)), Some(Segment::Static(y))) if x == y => {}
            _ => return false,
        }
    }
}

/// Whether the route `pattern` would answer a request to `path`
fn pattern_matches(pattern: &str, path: &str) -> bool {
    let mut concrete = path.split('/').skip(1);
    for segment in segments(pattern) {
        match segment {
            Segment::CatchAll => return concrete.next().is_some(),
            Segment::Param => match concrete.next() {
                Some(value) if !value.is_empty() => {}
                _ => return false,
            },
            Segment::Static(expected) => {
                if concrete.next() != Some(expected) {
                    return false;
                }
            }
        }
    }
    concrete.next().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::TransformError;
    use crate::domain::types::{QueryPayload, RestResponse, JSON_CONTENT_TYPE, TEXT_CONTENT_TYPE};
    use axum::http::{header, Method, StatusCode};
    use axum::routing::post;
    use axum::Json;
    use serde_json::{json, Value};
    use std::sync::atomic::Ordering;

    const PRESIDENTS_QUERY: &str = "query PresidentQuery { presidents { name } }";

    /// Execution route that echoes the received query back as data
    fn echo_executor() -> Router {
        Router::new().route(
            "/graphql",
            post(|Json(payload): Json<QueryPayload>| async move {
                Json(json!({ "query": payload.query }))
            }),
        )
    }

    /// Execution route that reports the authorization header it received
    fn auth_echo_executor() -> Router {
        Router::new().route(
            "/graphql",
            post(|headers: axum::http::HeaderMap| async move {
                let auth = headers
                    .get(header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("none")
                    .to_string();
                Json(json!({ "auth": auth }))
            }),
        )
    }

    fn endpoint(path: &str) -> EndpointDefinition {
        EndpointDefinition::with_query(path, "{ a }", |_| Ok(RestResponse::ok("a")))
    }

    fn fixed_executor(body: &'static str) -> Router {
        Router::new().route("/graphql", post(move || async move { body }))
    }

    fn presidents_adapter() -> RestAdapter {
        let mut adapter = RestAdapter::new(AdapterConfig::default());
        adapter
            .add_endpoint(EndpointDefinition::with_query("/presidents", PRESIDENTS_QUERY, |r| {
                Ok(RestResponse::ok(r["presidents"].clone()))
            }))
            .unwrap();
        adapter
    }

    async fn fetch(router: Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
        let response = router
            .oneshot(axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();
        (status, content_type, body)
    }

    #[test]
    fn test_registration_rejects_bad_paths() {
        let mut adapter = RestAdapter::new(AdapterConfig::default());
        for path in ["", "a", "/a/:", "/*rest/a", "/user_:name", "/files/a*b"] {
            assert_eq!(
                adapter.add_endpoint(endpoint(path)),
                Err(RegistrationError::InvalidPath(path.into()))
            );
        }
        assert!(matches!(
            adapter.add_endpoint(endpoint("/graphql")),
            Err(RegistrationError::ReservedPath(_))
        ));
        assert!(adapter.is_empty());
    }

    #[test]
    fn test_registration_rejects_duplicates() {
        let mut adapter = presidents_adapter();
        assert_eq!(
            adapter.add_endpoint(endpoint("/presidents")),
            Err(RegistrationError::DuplicatePath("/presidents".into()))
        );

        adapter.add_endpoint(endpoint("/presidents/:id")).unwrap();
        assert!(matches!(
            adapter.add_endpoint(endpoint("/presidents/:name")),
            Err(RegistrationError::DuplicatePath(_))
        ));
        assert_eq!(adapter.len(), 2);
    }

    #[test]
    fn test_remove_endpoint() {
        let mut adapter = presidents_adapter();
        assert!(adapter.remove_endpoint("/missing").is_none());
        let removed = adapter.remove_endpoint("/presidents").unwrap();
        assert_eq!(removed.path(), "/presidents");
        assert!(adapter.is_empty());
    }

    #[test]
    fn test_with_settings_validates() {
        let settings = AdapterSettings {
            execution_path: "graphql".into(),
            ..AdapterSettings::default()
        };
        assert!(RestAdapter::with_settings(AdapterConfig::default(), settings).is_err());
    }

    #[test]
    fn test_routes_conflict() {
        assert!(routes_conflict("/a/:id/b", "/a/:name/b"));
        assert!(routes_conflict("/items/:id", "/items/*rest"));
        assert!(routes_conflict("/items/*a", "/items/*b"));
        assert!(!routes_conflict("/a/:id", "/a/new"));
        assert!(!routes_conflict("/a/:id", "/a/:id/b"));
        assert!(!routes_conflict("/a", "/b"));
    }

    #[test]
    fn test_pattern_matches() {
        assert!(pattern_matches("/graphql", "/graphql"));
        assert!(pattern_matches("/:resource", "/graphql"));
        assert!(pattern_matches("/*rest", "/api/graphql"));
        assert!(pattern_matches("/api/:name", "/api/graphql"));
        assert!(!pattern_matches("/graphql/:id", "/graphql"));
        assert!(!pattern_matches("/presidents", "/graphql"));
        assert!(!pattern_matches("/:a/:b", "/graphql"));
    }

    #[test]
    fn test_param_and_catch_all_conflict_at_registration() {
        let mut adapter = RestAdapter::new(AdapterConfig::default());
        adapter.add_endpoint(endpoint("/items/:id")).unwrap();
        assert_eq!(
            adapter.add_endpoint(endpoint("/items/*rest")),
            Err(RegistrationError::DuplicatePath("/items/*rest".into()))
        );
        adapter.add_endpoint(endpoint("/items/new")).unwrap();

        // Building the router must not panic on what was accepted
        let _router = adapter.into_router(Router::new());
    }

    #[test]
    fn test_patterns_matching_execution_path_are_reserved() {
        let mut adapter = RestAdapter::new(AdapterConfig::default());
        for path in ["/:resource", "/*rest"] {
            assert_eq!(
                adapter.add_endpoint(endpoint(path)),
                Err(RegistrationError::ReservedPath(path.into()))
            );
        }
        adapter.add_endpoint(endpoint("/graphql/:id")).unwrap();
    }

    #[tokio::test]
    async fn test_execution_receives_built_query() {
        let mut adapter = RestAdapter::new(AdapterConfig::default());
        adapter
            .add_endpoint(EndpointDefinition::new(
                "/presidents/:id",
                |req: &InboundRequest| {
                    format!(
                        "{{ president(id: {}, fields: \"{}\") {{ name }} }}",
                        req.path_param("id").unwrap_or_default(),
                        req.query_param("fields").unwrap_or_default()
                    )
                },
                |r| Ok(RestResponse::ok(r["query"].clone())),
            ))
            .unwrap();

        let (status, content_type, body) =
            fetch(adapter.into_router(echo_executor()), "/presidents/7?fields=name").await;

        assert_eq!(status, StatusCode::OK);
        // A string body is written verbatim
        assert_eq!(content_type.as_deref(), Some(TEXT_CONTENT_TYPE));
        assert_eq!(body, b"{ president(id: 7, fields: \"name\") { name } }");
    }

    #[tokio::test]
    async fn test_success_transform() {
        let router = presidents_adapter().into_router(fixed_executor(
            r#"{"presidents":[{"name":"A"},{"name":"B"}]}"#,
        ));
        let (status, content_type, body) = fetch(router, "/presidents").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some(JSON_CONTENT_TYPE));
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!([{ "name": "A" }, { "name": "B" }]));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_bad_gateway() {
        let adapter = presidents_adapter();
        let metrics = adapter.metrics();
        let router = adapter.into_router(fixed_executor(r#"{"presidents":[{"na"#));

        let (status, content_type, body) = fetch(router, "/presidents").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(content_type.as_deref(), Some(JSON_CONTENT_TYPE));
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"]["code"], "malformed_payload");
        assert_eq!(metrics.fatal_failures.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_transform_failure_is_recovered() {
        let mut adapter = RestAdapter::new(AdapterConfig::default());
        adapter
            .add_endpoint(EndpointDefinition::with_query("/presidents", PRESIDENTS_QUERY, |r| {
                r["presidents"]
                    .as_array()
                    .filter(|list| !list.is_empty())
                    .map(|list| RestResponse::json(StatusCode::OK, json!(list)))
                    .ok_or_else(|| {
                        TransformError::with_status(StatusCode::NOT_FOUND, "no presidents")
                    })
            }))
            .unwrap();
        let metrics = adapter.metrics();

        let router = adapter.into_router(fixed_executor(r#"{"presidents":[]}"#));
        let (status, content_type, body) = fetch(router, "/presidents").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(content_type.as_deref(), Some(TEXT_CONTENT_TYPE));
        assert_eq!(body, b"no presidents");
        assert_eq!(metrics.transform_failures.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_panicking_transform_yields_500() {
        let mut adapter = RestAdapter::new(AdapterConfig::default());
        adapter
            .add_endpoint(EndpointDefinition::with_query("/boom", "{ boom }", |_| {
                panic!("transform exploded")
            }))
            .unwrap();

        let (status, _, _) = fetch(adapter.into_router(fixed_executor("{}")), "/boom").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_custom_execution_path() {
        let settings = AdapterSettings {
            execution_path: "/api/graphql".into(),
            ..AdapterSettings::default()
        };
        let mut adapter = RestAdapter::with_settings(AdapterConfig::default(), settings).unwrap();
        adapter
            .add_endpoint(EndpointDefinition::with_query("/ping", "{ ping }", |r| {
                Ok(RestResponse::ok(r["ping"].clone()))
            }))
            .unwrap();

        let executor = Router::new().route(
            "/api/graphql",
            post(|| async { Json(json!({ "ping": { "pong": true } })) }),
        );
        let (status, _, body) = fetch(adapter.into_router(executor), "/ping").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!({ "pong": true }));
    }

    #[tokio::test]
    async fn test_mount_keeps_app_routes() {
        let app = echo_executor().route("/health", get(|| async { "ok" }));
        let router = presidents_adapter().mount(app);

        let (status, _, body) = fetch(router.clone(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");

        // The adapter route answers GET only
        let response = router
            .oneshot(
                axum::http::Request::builder()
                    .method(Method::POST)
                    .uri("/presidents")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_headers_forwarded_to_execution() {
        let mut adapter = RestAdapter::new(AdapterConfig::default());
        adapter
            .add_endpoint(EndpointDefinition::with_query("/me", "{ me }", |r| {
                Ok(RestResponse::ok(r["auth"].clone()))
            }))
            .unwrap();

        let response = adapter
            .into_router(auth_echo_executor())
            .oneshot(
                axum::http::Request::builder()
                    .uri("/me")
                    .header(header::AUTHORIZATION, "Bearer token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"Bearer token");
    }

    #[tokio::test]
    async fn test_mount_keeps_execution_route_reachable() {
        let app = echo_executor().route("/health", get(|| async { "ok" }));
        let mut adapter = presidents_adapter();
        assert!(adapter
            .add_endpoint(EndpointDefinition::with_query("/:resource", "{ r }", |_| {
                Ok(RestResponse::ok("adapter"))
            }))
            .is_err());
        let router = adapter.mount(app);

        let response = router
            .clone()
            .oneshot(
                axum::http::Request::builder()
                    .method(Method::POST)
                    .uri("/graphql")
                    .header(header::CONTENT_TYPE, JSON_CONTENT_TYPE)
                    .body(Body::from(r#"{"query":"{ ping }"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (status, _, body) = fetch(router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");
    }

    /// Caller-defined classification: `status == "fail"` is an error
    fn order_router(payload: &'static str) -> (Router, Arc<AdapterMetrics>) {
        let config = AdapterConfig::new(
            |r| r["status"] == "fail",
            |r| {
                Ok(RestResponse::json(
                    StatusCode::CONFLICT,
                    json!({ "reason": r["reason"].clone() }),
                ))
            },
        );
        let mut adapter = RestAdapter::new(config);
        adapter
            .add_endpoint(EndpointDefinition::with_query("/order", "{ order }", |r| {
                Ok(RestResponse::json(StatusCode::CREATED, r["order"].clone()))
            }))
            .unwrap();
        let metrics = adapter.metrics();
        (adapter.into_router(fixed_executor(payload)), metrics)
    }

    #[tokio::test]
    async fn test_custom_error_goes_to_error_transform() {
        let (router, metrics) = order_router(r#"{"status":"fail","reason":"taken"}"#);
        let (status, content_type, body) = fetch(router, "/order").await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(content_type.as_deref(), Some(JSON_CONTENT_TYPE));
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({ "reason": "taken" }));
        assert_eq!(metrics.requests_upstream_error.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_custom_success_goes_to_success_transform() {
        // An errors list means nothing to this predicate
        let (router, metrics) =
            order_router(r#"{"status":"ok","order":{"id":7},"errors":[{"message":"x"}]}"#);
        let (status, _, body) = fetch(router, "/order").await;

        assert_eq!(status, StatusCode::CREATED);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({ "id": 7 }));
        assert_eq!(metrics.requests_success.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_headers_not_forwarded_when_disabled() {
        let settings = AdapterSettings {
            forward_headers: false,
            ..AdapterSettings::default()
        };
        let mut adapter = RestAdapter::with_settings(AdapterConfig::default(), settings).unwrap();
        adapter
            .add_endpoint(EndpointDefinition::with_query("/me", "{ me }", |r| {
                Ok(RestResponse::ok(r["auth"].clone()))
            }))
            .unwrap();

        let response = adapter
            .into_router(auth_echo_executor())
            .oneshot(
                axum::http::Request::builder()
                    .uri("/me")
                    .header(header::AUTHORIZATION, "Bearer token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"none");
    }

    #[tokio::test]
    async fn test_panicking_request_is_counted() {
        let mut adapter = RestAdapter::new(AdapterConfig::default());
        adapter
            .add_endpoint(EndpointDefinition::with_query("/boom", "{ boom }", |_| {
                panic!("transform exploded")
            }))
            .unwrap();
        let metrics = adapter.metrics();

        let (status, _, _) = fetch(adapter.into_router(fixed_executor("{}")), "/boom").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(metrics.requests_total.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.fatal_failures.load(Ordering::Relaxed), 1);
    }
}
