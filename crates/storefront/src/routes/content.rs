//! Delivery areas, offers and customer reviews.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use souk_core::ProductId;
use souk_core::pagination::{Page, PageRequest};
use souk_core::records::{CustomerReview, DeliveryArea, OfferEntry, ReviewInput};
use souk_db::{DeliveryAreaRepository, OfferRepository, ReviewRepository};

use crate::error::{ApiJson, ApiQuery, Result};
use crate::state::AppState;

/// Active delivery areas with their fees.
#[instrument(skip(state))]
pub async fn delivery_areas(State(state): State<AppState>) -> Result<Json<Arc<Vec<DeliveryArea>>>> {
    if let Some(areas) = state.cache().delivery_areas().await {
        return Ok(Json(areas));
    }

    let areas = Arc::new(DeliveryAreaRepository::new(state.pool()).list(true).await?);
    state.cache().set_delivery_areas(Arc::clone(&areas)).await;
    Ok(Json(areas))
}

/// Active offers in display order.
#[instrument(skip(state))]
pub async fn offers(State(state): State<AppState>) -> Result<Json<Arc<Vec<OfferEntry>>>> {
    if let Some(offers) = state.cache().offers().await {
        return Ok(Json(offers));
    }

    let offers = Arc::new(OfferRepository::new(state.pool()).list(true).await?);
    state.cache().set_offers(Arc::clone(&offers)).await;
    Ok(Json(offers))
}

/// Query string for review listings.
#[derive(Debug, Default, Deserialize)]
pub struct ReviewListQuery {
    pub product_id: Option<ProductId>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Approved reviews, newest first.
#[instrument(skip(state))]
pub async fn reviews(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ReviewListQuery>,
) -> Result<Json<Page<CustomerReview>>> {
    let defaults = PageRequest::default();
    let page = PageRequest::new(
        query.page.unwrap_or(defaults.page),
        query.per_page.unwrap_or(defaults.per_page),
    );
    let reviews = ReviewRepository::new(state.pool())
        .list_approved(query.product_id, page)
        .await?;
    Ok(Json(reviews))
}

/// Submit a review. It is hidden until approved by an admin.
#[instrument(skip(state, input))]
pub async fn submit_review(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ReviewInput>,
) -> Result<(StatusCode, Json<CustomerReview>)> {
    let review = ReviewRepository::new(state.pool()).submit(input).await?;
    Ok((StatusCode::CREATED, Json(review)))
}
