//! The proxied-route handler (§4.7): resolves the path, evaluates policy,
//! and hands off to the Proxy Core. One structured log line per request.

use crate::server::AppState;
use axum::Json;
use axum::body::{Body, Bytes};
use axum::extract::{ConnectInfo, RawQuery, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use secnex_core::error::GatewayError;
use secnex_core::path;
use secnex_core::policy::{self, RequestMeta};
use secnex_observability::log_request;
use secnex_proxy::InboundRequest;
use std::net::SocketAddr;
use std::time::Instant;

pub async fn dispatch(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    method: Method,
    headers: HeaderMap,
    RawQuery(raw_query): RawQuery,
    uri: Uri,
    body: Bytes,
) -> Response {
    let start = Instant::now();
    let remote_addr = addr.to_string();
    let url_path = uri.path().to_string();
    let raw_query = raw_query.unwrap_or_default();

    let (route_key, result) = handle(
        &state,
        &method,
        &headers,
        &raw_query,
        &url_path,
        &remote_addr,
        body,
    )
    .await;

    let (status, decision) = match &result {
        Ok(resp) => (resp.status().as_u16(), "allowed".to_string()),
        Err(e) => (e.status_code(), e.to_string()),
    };

    log_request(
        method.as_str(),
        &url_path,
        &route_key,
        &remote_addr,
        &decision,
        status,
        start.elapsed().as_secs_f64() * 1000.0,
    );

    match result {
        Ok(resp) => resp,
        Err(e) => error_response(&e),
    }
}

async fn handle(
    state: &AppState,
    method: &Method,
    headers: &HeaderMap,
    raw_query: &str,
    url_path: &str,
    remote_addr: &str,
    body: Bytes,
) -> (String, Result<Response, GatewayError>) {
    let resolved = match path::resolve(url_path, &state.server.base_path) {
        Ok(r) => r,
        Err(e) => return (String::new(), Err(e)),
    };

    let route = match state.table.get(&resolved.route_key) {
        Some(r) => r,
        None => return (resolved.route_key, Err(GatewayError::RouteNotFound)),
    };

    // A sub-path is only reachable when the route was configured to
    // forward it (§4.7 path-pattern registration).
    if !route.forward_sub_path && !resolved.remaining.is_empty() {
        return (resolved.route_key, Err(GatewayError::RouteNotFound));
    }

    let user_agent = headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let authorization = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let meta = RequestMeta {
        method: method.as_str(),
        remote_addr,
        user_agent,
        authorization,
    };

    if let Err(e) = policy::evaluate(&route, &meta) {
        return (resolved.route_key, Err(e));
    }

    let inbound = InboundRequest {
        method: method.clone(),
        headers: headers.clone(),
        body,
        raw_query: raw_query.to_string(),
        remote_addr: remote_addr.to_string(),
    };

    let result = state
        .proxy
        .forward(&route, &resolved.remaining, inbound)
        .await
        .map(|proxied| {
            let mut builder = Response::builder().status(proxied.status);
            *builder.headers_mut().expect("builder has no error yet") = proxied.headers;
            builder
                .body(Body::from(proxied.body))
                .expect("status and headers already validated by reqwest")
        });

    (resolved.route_key, result)
}

fn error_response(err: &GatewayError) -> Response {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(err.to_json_body())).into_response()
}
