#![allow(dead_code)]

use axum::http::header;
use axum::routing::post;
use axum::{Json, Router};
use graphql_rest_adapter::{
    AdapterConfig, AdapterServer, EndpointDefinition, QueryPayload, RestAdapter, RestResponse,
    ServerConfig,
};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

pub const PRESIDENTS_QUERY: &str = "query PresidentQuery { presidents { name } }";
pub const CHEESES_QUERY: &str = "query CheesesQuery { cheeses { name location } }";

/// Fake GraphQL app: answers each known query with a canned raw payload
pub fn graphql_app(payloads: HashMap<&'static str, String>) -> Router {
    let payloads = Arc::new(payloads);
    Router::new().route(
        "/graphql",
        post(move |Json(request): Json<QueryPayload>| {
            let payloads = Arc::clone(&payloads);
            async move {
                let body = payloads.get(request.query.as_str()).cloned().unwrap_or_default();
                ([(header::CONTENT_TYPE, "application/json")], body)
            }
        }),
    )
}

pub fn adapter() -> RestAdapter {
    let mut adapter = RestAdapter::new(AdapterConfig::default());
    adapter
        .add_endpoint(EndpointDefinition::with_query("/presidents", PRESIDENTS_QUERY, |r| {
            Ok(RestResponse::ok(r["presidents"].clone()))
        }))
        .unwrap();
    adapter
        .add_endpoint(EndpointDefinition::with_query("/cheeses", CHEESES_QUERY, |r| {
            Ok(RestResponse::ok(r["cheeses"].clone()))
        }))
        .unwrap();
    adapter
}

/// Serve the adapter mounted on the fake app; returns the base URL
pub async fn spawn(
    payloads: HashMap<&'static str, String>,
) -> (String, tokio::task::JoinHandle<()>) {
    let config = ServerConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        ..ServerConfig::default()
    };
    let mut server = AdapterServer::new(config, adapter().mount(graphql_app(payloads)));
    let addr = server.bind().await.unwrap();

    let handle = tokio::spawn(async move {
        server.serve().await.unwrap();
    });
    (format!("http://{}", addr), handle)
}
