//! HTTP route handlers for admin.
//!
//! Every route under `/api` requires the admin bearer token.
//!
//! # Route Structure
//!
//! ```text
//! GET    /api/admin/stats                          - Dashboard summary
//!
//! # Catalog
//! GET    /api/admin/product-types                  - Type / category tree
//! POST   /api/admin/product-types                  - Create type
//! PATCH  /api/admin/product-types/{id}             - Rename type
//! DELETE /api/admin/product-types/{id}             - Delete type (cascades)
//! POST   /api/admin/product-types/{id}/categories  - Create category
//! PATCH  /api/admin/categories/{id}                - Rename category
//! DELETE /api/admin/categories/{id}                - Delete category (cascades)
//! POST   /api/admin/categories/{id}/products       - Create product
//! GET    /api/admin/products                       - Product listing
//! GET    /api/admin/products/{id}                  - Product detail
//! PUT    /api/admin/products/{id}                  - Replace product
//! DELETE /api/admin/products/{id}                  - Delete product
//! POST   /api/admin/products/{id}/stock            - Adjust one variant
//! GET    /api/admin/inventory/low-stock            - Variants at or below threshold
//!
//! # Orders
//! GET    /api/admin/orders                         - All orders
//! POST   /api/admin/orders                         - Create approved order
//! GET    /api/admin/orders/{orderId}               - Order detail
//! DELETE /api/admin/orders/{orderId}               - Delete order record
//! PATCH  /api/admin/orders/{orderId}/cancel        - Cancel (restocks approved orders)
//! GET    /api/storeOrders                          - Storefront orders
//! PATCH  /api/storeOrders/{id}/confirm             - Approve and deduct stock
//! PATCH  /api/storeOrders/{id}/cancel              - Cancel store order
//!
//! # Records
//! GET|POST    /api/admin/promo-codes      PUT|DELETE /api/admin/promo-codes/{id}
//! GET|POST    /api/admin/delivery-areas   PUT|DELETE /api/admin/delivery-areas/{id}
//! GET         /api/admin/reviews          DELETE     /api/admin/reviews/{id}
//! PATCH       /api/admin/reviews/{id}/approve
//! GET|POST    /api/admin/offers           PUT|DELETE /api/admin/offers/{id}
//! ```

pub mod catalog;
pub mod orders;
pub mod products;
pub mod records;
pub mod stats;

use axum::{
    Router,
    http::StatusCode,
    middleware::from_extractor_with_state,
    routing::{delete, get, patch, post, put},
};
use serde::Deserialize;
use souk_core::pagination::PageRequest;

use crate::error::{AppError, Result};
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// Body for creating or renaming a type or category.
#[derive(Debug, Deserialize)]
pub struct NameInput {
    pub name: String,
}

/// Build a clamped page request from optional query parameters.
fn page_request(page: Option<u32>, per_page: Option<u32>) -> PageRequest {
    let defaults = PageRequest::default();
    PageRequest::new(
        page.unwrap_or(defaults.page),
        per_page.unwrap_or(defaults.per_page),
    )
}

/// Map a delete outcome to `204 No Content` or a 404.
fn deleted(found: bool, what: &str) -> Result<StatusCode> {
    if found {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("{what} not found")))
    }
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats::dashboard))
        // Catalog
        .route(
            "/product-types",
            get(catalog::tree).post(catalog::create_type),
        )
        .route(
            "/product-types/{id}",
            patch(catalog::rename_type).delete(catalog::delete_type),
        )
        .route(
            "/product-types/{id}/categories",
            post(catalog::create_category),
        )
        .route(
            "/categories/{id}",
            patch(catalog::rename_category).delete(catalog::delete_category),
        )
        .route("/categories/{id}/products", post(products::create))
        .route("/products", get(products::list))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::replace)
                .delete(products::delete),
        )
        .route("/products/{id}/stock", post(products::adjust_stock))
        .route("/inventory/low-stock", get(products::low_stock))
        // Orders
        .route("/orders", get(orders::list).post(orders::create))
        .route(
            "/orders/{order_id}",
            get(orders::show).delete(orders::delete),
        )
        .route("/orders/{order_id}/cancel", patch(orders::cancel))
        // Records
        .route(
            "/promo-codes",
            get(records::list_promo_codes).post(records::create_promo_code),
        )
        .route(
            "/promo-codes/{id}",
            put(records::update_promo_code).delete(records::delete_promo_code),
        )
        .route(
            "/delivery-areas",
            get(records::list_delivery_areas).post(records::create_delivery_area),
        )
        .route(
            "/delivery-areas/{id}",
            put(records::update_delivery_area).delete(records::delete_delivery_area),
        )
        .route("/reviews", get(records::list_reviews))
        .route("/reviews/{id}", delete(records::delete_review))
        .route("/reviews/{id}/approve", patch(records::approve_review))
        .route(
            "/offers",
            get(records::list_offers).post(records::create_offer),
        )
        .route(
            "/offers/{id}",
            put(records::update_offer).delete(records::delete_offer),
        )
}

fn store_order_routes() -> Router<AppState> {
    Router::new()
        .route("/storeOrders", get(orders::list_store_orders))
        .route("/storeOrders/{id}/confirm", patch(orders::confirm_store_order))
        .route("/storeOrders/{id}/cancel", patch(orders::cancel_store_order))
}

/// Create all `/api` routes, guarded by the bearer token check.
pub fn routes(state: AppState) -> Router<AppState> {
    let api = Router::new()
        .nest("/admin", admin_routes())
        .merge(store_order_routes())
        .route_layer(from_extractor_with_state::<RequireAdminAuth, _>(state));

    Router::new().nest("/api", api)
}
