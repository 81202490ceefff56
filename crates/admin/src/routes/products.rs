//! Product management and stock adjustments.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use souk_core::catalog::{
    LowStockEntry, Product, ProductFilter, ProductInput, ProductSummary, StockAdjustment,
};
use souk_core::pagination::Page;
use souk_core::{CategoryId, ProductId, ProductTypeId};
use souk_db::CatalogRepository;

use super::{deleted, page_request};
use crate::error::{ApiJson, ApiPath, ApiQuery, AppError, Result};
use crate::state::AppState;

/// Query string for product listings; same filters as the storefront.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub type_id: Option<ProductTypeId>,
    pub category_id: Option<CategoryId>,
    pub search: Option<String>,
    #[serde(default)]
    pub in_stock_only: bool,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductListQuery>,
) -> Result<Json<Page<ProductSummary>>> {
    let page = page_request(query.page, query.per_page);
    let filter = ProductFilter {
        type_id: query.type_id,
        category_id: query.category_id,
        search: query.search,
        in_stock_only: query.in_stock_only,
    };
    let products = CatalogRepository::new(state.pool())
        .list_products(&filter, page)
        .await?;
    Ok(Json(products))
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    CatalogRepository::new(state.pool())
        .get_product(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Product {id} not found")))
}

/// Create a product with its full color/size stock matrix.
#[instrument(skip(state, input), fields(name = %input.name))]
pub async fn create(
    State(state): State<AppState>,
    ApiPath(category_id): ApiPath<CategoryId>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = CatalogRepository::new(state.pool())
        .create_product(category_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Replace a product, including its stock matrix.
#[instrument(skip(state, input))]
pub async fn replace(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<Json<Product>> {
    let product = CatalogRepository::new(state.pool())
        .replace_product(id, input)
        .await?;
    Ok(Json(product))
}

#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<StatusCode> {
    deleted(
        CatalogRepository::new(state.pool()).delete_product(id).await?,
        "Product",
    )
}

/// Stock level after an adjustment.
#[derive(Debug, Serialize)]
pub struct StockLevelResponse {
    pub product_id: ProductId,
    pub color: String,
    pub size: String,
    pub quantity: i32,
}

/// Add to or remove from one variant's stock.
#[instrument(skip(state))]
pub async fn adjust_stock(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(adjustment): ApiJson<StockAdjustment>,
) -> Result<Json<StockLevelResponse>> {
    let quantity = CatalogRepository::new(state.pool())
        .adjust_stock(id, &adjustment)
        .await?;
    Ok(Json(StockLevelResponse {
        product_id: id,
        color: adjustment.color.trim().to_string(),
        size: adjustment.size.trim().to_string(),
        quantity,
    }))
}

/// Query string for the low-stock report.
#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    pub threshold: Option<i32>,
}

/// Variants at or below the threshold (default `LOW_STOCK_THRESHOLD`).
#[instrument(skip(state))]
pub async fn low_stock(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LowStockQuery>,
) -> Result<Json<Vec<LowStockEntry>>> {
    let threshold = query
        .threshold
        .unwrap_or(state.config().low_stock_threshold);
    if threshold < 0 {
        return Err(AppError::BadRequest(
            "threshold must not be negative".to_string(),
        ));
    }
    let entries = CatalogRepository::new(state.pool())
        .low_stock(threshold)
        .await?;
    Ok(Json(entries))
}
