//! Souk Admin library.
//!
//! Back-office JSON API: catalog and stock management, order approval and
//! cancellation, promo codes, delivery areas, review moderation, offers and
//! the dashboard summary.
//!
//! # Security
//!
//! Every `/api` route requires `Authorization: Bearer <ADMIN_API_TOKEN>`.
//! Bind to a private interface; the token is the only access control.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use std::time::Duration;

use axum::{
    Router,
    extract::{MatchedPath, Request, State},
    http::StatusCode,
    response::Response,
    routing::get,
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::{Level, Span};

use crate::state::AppState;

/// Build the admin router with its middleware stack.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes(state.clone()))
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

/// Liveness health check endpoint.
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
    use crate::config::AdminConfig;

    const TOKEN: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6d";

    fn test_state() -> AppState {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://souk@127.0.0.1:1/souk")
            .unwrap();
        let config = AdminConfig {
            database_url: SecretString::from("postgres://souk@127.0.0.1:1/souk"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            api_token: SecretString::from(TOKEN),
            low_stock_threshold: 5,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_traces_sample_rate: 0.0,
        };
        AppState::new(config, pool)
    }

    fn request(method: Method, uri: &str, token: Option<&str>, body: Option<&Value>) -> Request {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn message(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        value["message"].as_str().unwrap().to_owned()
    }

    #[tokio::test]
    async fn test_health_needs_no_token() {
        let response = app(test_state())
            .oneshot(request(Method::GET, "/health", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let response = app(test_state())
            .oneshot(request(Method::GET, "/api/admin/stats", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    }

    #[tokio::test]
    async fn test_wrong_token_is_unauthorized() {
        let response = app(test_state())
            .oneshot(request(
                Method::PATCH,
                "/api/storeOrders/7/confirm",
                Some("not-the-admin-token-but-still-long-enough"),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_token_checked_before_body() {
        let response = app(test_state())
            .oneshot(request(
                Method::POST,
                "/api/admin/orders",
                None,
                Some(&json!({ "items": [] })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_order_with_empty_cart_is_rejected() {
        let body = json!({
            "customer": { "name": "Ruslan", "phone": "+7 702 555 0199", "address": "4 Dostyk St" },
            "items": []
        });
        let response = app(test_state())
            .oneshot(request(Method::POST, "/api/admin/orders", Some(TOKEN), Some(&body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(message(response).await, "cart is empty");
    }

    #[tokio::test]
    async fn test_promo_code_with_bad_percentage_is_rejected() {
        let body = json!({
            "code": "spring",
            "percentage": 150,
            "valid_from": "2026-03-01T00:00:00Z",
            "valid_until": "2026-04-01T00:00:00Z"
        });
        let response = app(test_state())
            .oneshot(request(Method::POST, "/api/admin/promo-codes", Some(TOKEN), Some(&body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(message(response).await.contains("percentage"));
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_bad_request() {
        let response = app(test_state())
            .oneshot(request(Method::GET, "/api/admin/products/abc", Some(TOKEN), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stock_delta_out_of_range_is_rejected() {
        for delta in [i64::from(i32::MIN), 0, i64::from(i32::MAX)] {
            let body = json!({ "color": "Red", "size": "M", "delta": delta });
            let response = app(test_state())
                .oneshot(request(
                    Method::POST,
                    "/api/admin/products/1/stock",
                    Some(TOKEN),
                    Some(&body),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "delta {delta}");
            assert!(message(response).await.starts_with("delta:"));
        }
    }

    #[tokio::test]
    async fn test_product_price_beyond_money_column_is_rejected() {
        let body = json!({ "name": "Linen Shirt", "price": "99999999999.00" });
        let response = app(test_state())
            .oneshot(request(
                Method::POST,
                "/api/admin/categories/1/products",
                Some(TOKEN),
                Some(&body),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(message(response).await.starts_with("price:"));
    }

    #[tokio::test]
    async fn test_negative_low_stock_threshold_is_rejected() {
        let response = app(test_state())
            .oneshot(request(
                Method::GET,
                "/api/admin/inventory/low-stock?threshold=-1",
                Some(TOKEN),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
