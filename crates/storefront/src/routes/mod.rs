//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                   - Liveness check
//! GET  /health/ready             - Database readiness check
//!
//! GET  /api/catalog              - Product type / category tree (cached)
//! GET  /api/products             - Product listing (filters + paging)
//! GET  /api/products/{id}        - Product detail
//! POST /api/cart/quote           - Price cart lines
//! POST /api/promo-codes/check    - Check a promo code
//! GET  /api/delivery-areas       - Active delivery areas (cached)
//! GET  /api/offers               - Active offers (cached)
//! GET  /api/reviews              - Approved reviews
//! POST /api/reviews              - Submit a review (rate limited)
//! POST /api/storeOrders          - Place a store order (rate limited)
//! ```

pub mod cart;
pub mod catalog;
pub mod content;
pub mod orders;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::submission_rate_limiter;
use crate::state::AppState;

/// Create all `/api` routes for the storefront.
///
/// Order and review submission share one per-IP limiter.
pub fn routes() -> Router<AppState> {
    let limiter = submission_rate_limiter();

    let api = Router::new()
        .route("/catalog", get(catalog::tree))
        .route("/products", get(catalog::list_products))
        .route("/products/{id}", get(catalog::show_product))
        .route("/cart/quote", post(cart::quote))
        .route("/promo-codes/check", post(cart::check_promo))
        .route("/delivery-areas", get(content::delivery_areas))
        .route("/offers", get(content::offers))
        .route(
            "/reviews",
            get(content::reviews).merge(post(content::submit_review).layer(limiter.clone())),
        )
        .route("/storeOrders", post(orders::place).layer(limiter));

    Router::new().nest("/api", api)
}
