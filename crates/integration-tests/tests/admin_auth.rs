//! Admin token enforcement across the whole `/api` surface.
//!
//! These run without a database: the token check rejects requests before
//! any handler touches the pool.

use axum::http::{Method, StatusCode};
use souk_integration_tests::TestContext;

fn guarded() -> Vec<(Method, &'static str)> {
    vec![
        (Method::GET, "/api/admin/stats"),
        (Method::GET, "/api/admin/product-types"),
        (Method::DELETE, "/api/admin/categories/3"),
        (Method::PUT, "/api/admin/products/9"),
        (Method::POST, "/api/admin/products/9/stock"),
        (Method::GET, "/api/admin/inventory/low-stock"),
        (Method::GET, "/api/admin/orders"),
        (Method::PATCH, "/api/admin/orders/4/cancel"),
        (Method::GET, "/api/storeOrders"),
        (Method::PATCH, "/api/storeOrders/4/confirm"),
        (Method::PATCH, "/api/storeOrders/4/cancel"),
        (Method::GET, "/api/admin/promo-codes"),
        (Method::DELETE, "/api/admin/delivery-areas/2"),
        (Method::PATCH, "/api/admin/reviews/5/approve"),
        (Method::POST, "/api/admin/offers"),
    ]
}

#[tokio::test]
async fn test_every_admin_route_requires_token() {
    let ctx = TestContext::offline();
    for (method, uri) in guarded() {
        let (status, body) = ctx.admin_as(None, method.clone(), uri).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(body["message"], "Missing bearer token", "{method} {uri}");
    }
}

#[tokio::test]
async fn test_wrong_token_and_scheme_are_rejected() {
    let ctx = TestContext::offline();

    let (status, body) = ctx
        .admin_as(
            Some("Bearer zZ9$yY8!xX7@wW6#vV5&uU4*tT3^sS2r"),
            Method::GET,
            "/api/admin/stats",
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid bearer token");

    let basic = format!("Basic {}", souk_integration_tests::ADMIN_TOKEN);
    let (status, _) = ctx
        .admin_as(Some(&basic), Method::GET, "/api/admin/stats")
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_storefront_cannot_confirm_orders() {
    let ctx = TestContext::offline();
    let (status, _) = ctx
        .storefront(Method::PATCH, "/api/storeOrders/4/confirm", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_is_public_on_both_services() {
    let ctx = TestContext::offline();
    let (status, body) = ctx.storefront(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");

    let (status, _) = ctx.admin_as(None, Method::GET, "/health").await;
    assert_eq!(status, StatusCode::OK);
}
