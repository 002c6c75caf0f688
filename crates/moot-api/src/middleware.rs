//! Tower middleware for the Moot API

use axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::{Duration, Instant};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::Instrument;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request ID wrapper
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// Tags each request with an id, echoed back in `X-Request-ID`
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// Request tracing middleware
pub async fn tracing_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let span = tracing::info_span!(
        "http_request",
        method = %method,
        path = %path,
        request_id = %request_id,
    );

    let response = next.run(request).instrument(span).await;

    tracing::info!(
        method = %method,
        path = %path,
        request_id = %request_id,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );

    response
}

/// CORS from `MOOT_CORS_ORIGINS` (comma-separated, `*` for any origin).
/// Unset or invalid falls back to localhost only.
pub fn cors_layer() -> CorsLayer {
    cors_for(std::env::var("MOOT_CORS_ORIGINS").ok().as_deref())
}

fn cors_for(origins: Option<&str>) -> CorsLayer {
    let localhost = AllowOrigin::exact(HeaderValue::from_static("http://localhost"));

    let allow_origin = match origins.map(str::trim) {
        Some("*") => AllowOrigin::any(),
        Some(list) if !list.is_empty() => {
            let parsed: Vec<HeaderValue> = list
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if parsed.is_empty() {
                tracing::warn!("MOOT_CORS_ORIGINS contains no valid origins, using localhost");
                localhost
            } else {
                tracing::info!("CORS configured for {} origin(s)", parsed.len());
                AllowOrigin::list(parsed)
            }
        }
        _ => {
            tracing::debug!("MOOT_CORS_ORIGINS not set, using localhost");
            localhost
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers(Any)
        .expose_headers([header::HeaderName::from_static(REQUEST_ID_HEADER)])
        .max_age(Duration::from_secs(3600))
}

#[allow(deprecated)]
pub fn timeout_layer(duration: Duration) -> tower_http::timeout::TimeoutLayer {
    tower_http::timeout::TimeoutLayer::new(duration)
}

pub fn body_limit_layer(limit: usize) -> tower_http::limit::RequestBodyLimitLayer {
    tower_http::limit::RequestBodyLimitLayer::new(limit)
}
