//! Product type and category management.
//!
//! Deleting a type removes its categories, and deleting a category removes
//! its products, through foreign key cascades.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use souk_core::catalog::{Category, ProductType, ProductTypeNode};
use souk_core::{CategoryId, ProductTypeId};
use souk_db::CatalogRepository;

use super::{NameInput, deleted};
use crate::error::{ApiJson, ApiPath, Result};
use crate::state::AppState;

#[instrument(skip(state))]
pub async fn tree(State(state): State<AppState>) -> Result<Json<Vec<ProductTypeNode>>> {
    Ok(Json(CatalogRepository::new(state.pool()).tree().await?))
}

#[instrument(skip(state))]
pub async fn create_type(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NameInput>,
) -> Result<(StatusCode, Json<ProductType>)> {
    let created = CatalogRepository::new(state.pool())
        .create_type(&input.name)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(state))]
pub async fn rename_type(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductTypeId>,
    ApiJson(input): ApiJson<NameInput>,
) -> Result<Json<ProductType>> {
    let renamed = CatalogRepository::new(state.pool())
        .rename_type(id, &input.name)
        .await?;
    Ok(Json(renamed))
}

#[instrument(skip(state))]
pub async fn delete_type(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductTypeId>,
) -> Result<StatusCode> {
    deleted(
        CatalogRepository::new(state.pool()).delete_type(id).await?,
        "Product type",
    )
}

#[instrument(skip(state))]
pub async fn create_category(
    State(state): State<AppState>,
    ApiPath(type_id): ApiPath<ProductTypeId>,
    ApiJson(input): ApiJson<NameInput>,
) -> Result<(StatusCode, Json<Category>)> {
    let created = CatalogRepository::new(state.pool())
        .create_category(type_id, &input.name)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(state))]
pub async fn rename_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CategoryId>,
    ApiJson(input): ApiJson<NameInput>,
) -> Result<Json<Category>> {
    let renamed = CatalogRepository::new(state.pool())
        .rename_category(id, &input.name)
        .await?;
    Ok(Json(renamed))
}

#[instrument(skip(state))]
pub async fn delete_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<StatusCode> {
    deleted(
        CatalogRepository::new(state.pool())
            .delete_category(id)
            .await?,
        "Category",
    )
}
