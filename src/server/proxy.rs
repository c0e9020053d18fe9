//! Pass-through audio proxy
//!
//! `GET /api/proxy?url=…` pipes the raw stream bytes to the client with
//! permissive CORS headers, forwarding `Range` requests so seekable
//! clients keep working. No parsing happens here; metadata extraction is
//! the registry's job.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use super::AppState;

/// Query parameters accepted by the proxy endpoint.
#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub url: Option<String>,
}

/// `GET /api/proxy?url=…`
pub async fn proxy_stream(
    State(state): State<AppState>,
    Query(query): Query<ProxyQuery>,
    headers: HeaderMap,
) -> Response {
    let Some(url) = query.url else {
        return (StatusCode::BAD_REQUEST, "Missing url parameter").into_response();
    };
    if !crate::registry::store::is_http_url(&url) {
        return (StatusCode::BAD_REQUEST, "Invalid URL scheme").into_response();
    }

    let mut request = state.proxy_client.get(&url);
    if let Some(range) = headers.get(header::RANGE) {
        request = request.header(header::RANGE, range);
    }
    if let Some(agent) = headers.get(header::USER_AGENT) {
        request = request.header(header::USER_AGENT, agent);
    }

    let upstream = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(stream = %url, error = %e, "Proxy upstream request failed");
            return (StatusCode::BAD_GATEWAY, "Bad gateway").into_response();
        }
    };

    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);

    let mut builder = Response::builder()
        .status(status)
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header(
            header::CONTENT_TYPE,
            upstream
                .headers()
                .get(header::CONTENT_TYPE)
                .cloned()
                .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream")),
        )
        .header(
            header::ACCEPT_RANGES,
            upstream
                .headers()
                .get(header::ACCEPT_RANGES)
                .cloned()
                .unwrap_or_else(|| HeaderValue::from_static("bytes")),
        );
    if let Some(length) = upstream.headers().get(header::CONTENT_LENGTH) {
        builder = builder.header(header::CONTENT_LENGTH, length);
    }

    match builder.body(Body::from_stream(upstream.bytes_stream())) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build proxy response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `OPTIONS /api/proxy` — CORS preflight.
pub async fn preflight() -> Response {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "GET,HEAD,OPTIONS"),
            (
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                "Range,Accept,User-Agent",
            ),
        ],
    )
        .into_response()
}
