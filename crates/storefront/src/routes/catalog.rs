//! Catalog tree and product route handlers.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use souk_core::catalog::{ProductFilter, ProductSummary, ProductTypeNode, StorefrontProduct};
use souk_core::pagination::{Page, PageRequest};
use souk_core::{CategoryId, ProductId, ProductTypeId};
use souk_db::CatalogRepository;

use crate::error::{ApiPath, ApiQuery, AppError, Result};
use crate::state::AppState;

/// Query string for product listings.
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

impl ProductListQuery {
    fn into_parts(self) -> (ProductFilter, PageRequest) {
        let defaults = PageRequest::default();
        let page = PageRequest::new(
            self.page.unwrap_or(defaults.page),
            self.per_page.unwrap_or(defaults.per_page),
        );
        let filter = ProductFilter {
            type_id: self.type_id,
            category_id: self.category_id,
            search: self.search,
            in_stock_only: self.in_stock_only,
        };
        (filter, page)
    }
}

/// Product types with their categories, served from the cache when fresh.
#[instrument(skip(state))]
pub async fn tree(State(state): State<AppState>) -> Result<Json<Arc<Vec<ProductTypeNode>>>> {
    if let Some(tree) = state.cache().tree().await {
        return Ok(Json(tree));
    }

    let tree = Arc::new(CatalogRepository::new(state.pool()).tree().await?);
    state.cache().set_tree(Arc::clone(&tree)).await;
    Ok(Json(tree))
}

/// Paged product listing.
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductListQuery>,
) -> Result<Json<Page<ProductSummary>>> {
    let (filter, page) = query.into_parts();
    let products = CatalogRepository::new(state.pool())
        .list_products(&filter, page)
        .await?;
    Ok(Json(products))
}

/// Product detail with its colors and sizes. The cost price is left out.
#[instrument(skip(state), fields(product_id = %id))]
pub async fn show_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<StorefrontProduct>> {
    CatalogRepository::new(state.pool())
        .get_product(id)
        .await?
        .map(|product| Json(product.into()))
        .ok_or_else(|| AppError::NotFound(format!("Product {id} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_defaults_and_clamps() {
        let (filter, page) = ProductListQuery::default().into_parts();
        assert!(filter.search.is_none());
        assert_eq!(page, PageRequest::default());

        let query = ProductListQuery {
            page: Some(0),
            per_page: Some(1000),
            search: Some("linen".to_string()),
            ..ProductListQuery::default()
        };
        let (filter, page) = query.into_parts();
        assert_eq!(page, PageRequest::new(1, PageRequest::MAX_PER_PAGE));
        assert_eq!(filter.search.as_deref(), Some("linen"));
    }
}
