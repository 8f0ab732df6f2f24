// Router assembly: permissive CORS in debug builds, an origin allow-list in
// release, a privacy-conscious trace span (method + path, no query string,
// no client IP), and baseline security headers.

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.cors_origins.clone();

    Router::new()
        .route("/extract", post(handlers::extract))
        .route("/status", get(handlers::status))
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
        .layer(cors_layer(&cors_origins))
        .layer(SetResponseHeaderLayer::overriding(
            header::HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
}

/// The userscript's origin varies by install, so debug builds accept any
/// origin. Release builds restrict to `CORS_ORIGINS`.
fn cors_layer(origins: &[String]) -> tower_http::cors::CorsLayer {
    if cfg!(debug_assertions) {
        tower_http::cors::CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|s| s.parse().ok()).collect();
        tower_http::cors::CorsLayer::new()
            .allow_origin(allowed)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    }
}
