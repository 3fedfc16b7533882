//! Sporeline storefront library.
//!
//! This crate provides the storefront as a library so the router can be
//! driven directly in tests; `main.rs` only wires config, telemetry and the
//! listener.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analytics;
pub mod config;
pub mod error;
pub mod feeds;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod og;
pub mod prefetch;
pub mod routes;
pub mod search;
pub mod seo;
pub mod services;
pub mod shopify;
pub mod state;

#[cfg(test)]
mod test_support;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn,
    routing::get,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use state::AppState;

/// Directory served under `/static`.
const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Build the full application router with every middleware layer.
///
/// Layers are listed innermost first; see [`middleware`] for the resulting
/// order.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(from_fn(middleware::csp_nonce_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(middleware::make_request_span::<axum::body::Body>))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the Storefront API is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.storefront().get_shop_name().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::header;
    use tower::ServiceExt;

    use super::*;
    use crate::routes::tests::{body_string, get, test_app};

    #[tokio::test]
    async fn test_health() {
        let (app, _) = test_app();
        let response = app.oneshot(get("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(response.headers()["x-frame-options"], "DENY");
        assert_eq!(body_string(response).await, "ok");
    }

    #[tokio::test]
    async fn test_readiness_fails_without_upstream() {
        let (app, _) = test_app();
        let response = app.oneshot(get("/health/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_page_csp_carries_nonce() {
        let (app, _) = test_app();
        let response = app.oneshot(get("/no-such-page")).await.unwrap();

        let csp = response.headers()[header::CONTENT_SECURITY_POLICY]
            .to_str()
            .unwrap()
            .to_string();
        let html = body_string(response).await;
        let nonce = csp
            .split("'nonce-")
            .nth(1)
            .and_then(|rest| rest.split('\'').next())
            .unwrap();
        assert!(html.contains(&format!("nonce=\"{nonce}\"")));
    }
}
