//! Souk Storefront library.
//!
//! Public JSON API: catalog browsing, cart quotes, promo checks, store order
//! placement and customer reviews. The binary in `main.rs` only adds
//! configuration, logging and the listener.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use std::time::Duration;

use axum::{
    Router,
    extract::{MatchedPath, Request, State},
    http::{HeaderValue, StatusCode},
    response::Response,
    routing::get,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::{Level, Span};

use crate::state::AppState;

/// Build the storefront router with its middleware stack.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config().cors_origins);

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .layer(cors)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request| {
                    let route = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map_or_else(|| request.uri().path().to_owned(), |p| p.as_str().to_owned());
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        route = %route,
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .on_response(response, latency, span);
                }),
        )
        .with_state(state)
}

/// CORS for browser clients. No configured origins means any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok())
                .collect::<Vec<_>>(),
        )
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Liveness health check endpoint. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match souk_db::ping(state.pool()).await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Method, header};
    use secrecy::SecretString;
    use serde_json::{Value, json};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::StorefrontConfig;

    /// State whose pool never connects; requests that reach the database fail
    /// quickly instead of hanging.
    fn test_state() -> AppState {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://souk@127.0.0.1:1/souk")
            .unwrap();
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://souk@127.0.0.1:1/souk"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            catalog_cache_ttl: Duration::from_secs(60),
            cors_origins: Vec::new(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_traces_sample_rate: 0.0,
        };
        AppState::new(config, pool)
    }

    fn post_json(uri: &str, body: &Value) -> Request {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "203.0.113.10")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(test_state())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_readiness_without_database() {
        let response = app(test_state())
            .oneshot(
                Request::builder()
                    .uri("/health/ready")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_store_order_with_empty_cart_is_rejected() {
        let body = json!({
            "customer": {
                "name": "Aigerim",
                "phone": "+7 701 555 0102",
                "address": "12 Abay Ave"
            },
            "items": []
        });
        let response = app(test_state())
            .oneshot(post_json("/api/storeOrders", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["message"], "cart is empty");
    }

    #[tokio::test]
    async fn test_store_order_with_bad_phone_is_rejected() {
        let body = json!({
            "customer": { "name": "Aigerim", "phone": "call me", "address": "12 Abay Ave" },
            "items": [{ "product_id": 1, "color": "Red", "size": "M", "quantity": 1 }]
        });
        let response = app(test_state())
            .oneshot(post_json("/api/storeOrders", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let message = json_body(response).await["message"].as_str().unwrap().to_owned();
        assert!(message.contains("phone"), "{message}");
    }

    #[tokio::test]
    async fn test_malformed_json_returns_message() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/cart/quote")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"items\": "))
            .unwrap();
        let response = app(test_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["message"].is_string());
    }

    #[tokio::test]
    async fn test_non_numeric_product_id_returns_message() {
        let response = app(test_state())
            .oneshot(
                Request::builder()
                    .uri("/api/products/abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        assert!(json_body(response).await["message"].is_string());
    }

    #[tokio::test]
    async fn test_bad_query_string_returns_message() {
        let response = app(test_state())
            .oneshot(
                Request::builder()
                    .uri("/api/products?page=first")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["message"].is_string());
    }

    #[tokio::test]
    async fn test_review_with_bad_rating_is_rejected() {
        let body = json!({ "customer_name": "Dana", "rating": 9 });
        let response = app(test_state())
            .oneshot(post_json("/api/reviews", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_submissions_are_rate_limited() {
        let app = app(test_state());
        let body = json!({ "customer_name": "Dana", "rating": 0 });
        let mut statuses = Vec::new();
        for _ in 0..7 {
            let response = app
                .clone()
                .oneshot(post_json("/api/reviews", &body))
                .await
                .unwrap();
            statuses.push(response.status());
        }
        assert!(statuses.contains(&StatusCode::BAD_REQUEST));
        assert_eq!(statuses.last(), Some(&StatusCode::TOO_MANY_REQUESTS));
    }

    #[tokio::test]
    async fn test_cors_preflight_allowed() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/catalog")
            .header(header::ORIGIN, "https://shop.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();
        let response = app(test_state()).oneshot(request).await.unwrap();
        assert!(
            response
                .headers()
                .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        );
    }
}
