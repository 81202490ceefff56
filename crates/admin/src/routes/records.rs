//! Promo codes, delivery areas, reviews and offers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use souk_core::pagination::Page;
use souk_core::promo::{PromoCode, PromoCodeInput};
use souk_core::records::{
    CustomerReview, DeliveryArea, DeliveryAreaInput, OfferEntry, OfferInput,
};
use souk_core::{DeliveryAreaId, OfferId, PromoCodeId, ReviewId};
use souk_db::{
    DeliveryAreaRepository, OfferRepository, PromoCodeRepository, RepositoryError,
    ReviewRepository,
};

use super::{deleted, page_request};
use crate::error::{ApiJson, ApiPath, ApiQuery, Result};
use crate::state::AppState;

// =============================================================================
// Promo codes
// =============================================================================

#[instrument(skip(state))]
pub async fn list_promo_codes(State(state): State<AppState>) -> Result<Json<Vec<PromoCode>>> {
    Ok(Json(PromoCodeRepository::new(state.pool()).list().await?))
}

#[instrument(skip(state, input), fields(code = %input.code))]
pub async fn create_promo_code(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<PromoCodeInput>,
) -> Result<(StatusCode, Json<PromoCode>)> {
    let valid = input.validate().map_err(RepositoryError::from)?;
    let promo = PromoCodeRepository::new(state.pool()).create(&valid).await?;
    Ok((StatusCode::CREATED, Json(promo)))
}

#[instrument(skip(state, input))]
pub async fn update_promo_code(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<PromoCodeId>,
    ApiJson(input): ApiJson<PromoCodeInput>,
) -> Result<Json<PromoCode>> {
    let valid = input.validate().map_err(RepositoryError::from)?;
    let promo = PromoCodeRepository::new(state.pool())
        .update(id, &valid)
        .await?;
    Ok(Json(promo))
}

#[instrument(skip(state))]
pub async fn delete_promo_code(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<PromoCodeId>,
) -> Result<StatusCode> {
    deleted(
        PromoCodeRepository::new(state.pool()).delete(id).await?,
        "Promo code",
    )
}

// =============================================================================
// Delivery areas
// =============================================================================

/// All delivery areas, including inactive ones.
#[instrument(skip(state))]
pub async fn list_delivery_areas(State(state): State<AppState>) -> Result<Json<Vec<DeliveryArea>>> {
    Ok(Json(DeliveryAreaRepository::new(state.pool()).list(false).await?))
}

#[instrument(skip(state, input))]
pub async fn create_delivery_area(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<DeliveryAreaInput>,
) -> Result<(StatusCode, Json<DeliveryArea>)> {
    let area = DeliveryAreaRepository::new(state.pool()).create(input).await?;
    Ok((StatusCode::CREATED, Json(area)))
}

#[instrument(skip(state, input))]
pub async fn update_delivery_area(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<DeliveryAreaId>,
    ApiJson(input): ApiJson<DeliveryAreaInput>,
) -> Result<Json<DeliveryArea>> {
    let area = DeliveryAreaRepository::new(state.pool())
        .update(id, input)
        .await?;
    Ok(Json(area))
}

#[instrument(skip(state))]
pub async fn delete_delivery_area(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<DeliveryAreaId>,
) -> Result<StatusCode> {
    deleted(
        DeliveryAreaRepository::new(state.pool()).delete(id).await?,
        "Delivery area",
    )
}

// =============================================================================
// Reviews
// =============================================================================

/// Query string for the moderation queue.
#[derive(Debug, Default, Deserialize)]
pub struct ReviewPageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Every review, unapproved first.
#[instrument(skip(state))]
pub async fn list_reviews(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ReviewPageQuery>,
) -> Result<Json<Page<CustomerReview>>> {
    let reviews = ReviewRepository::new(state.pool())
        .list_all(page_request(query.page, query.per_page))
        .await?;
    Ok(Json(reviews))
}

#[instrument(skip(state))]
pub async fn approve_review(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ReviewId>,
) -> Result<Json<CustomerReview>> {
    let review = ReviewRepository::new(state.pool()).approve(id).await?;
    tracing::info!(review_id = %id, "review approved");
    Ok(Json(review))
}

#[instrument(skip(state))]
pub async fn delete_review(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ReviewId>,
) -> Result<StatusCode> {
    deleted(
        ReviewRepository::new(state.pool()).delete(id).await?,
        "Review",
    )
}

// =============================================================================
// Offers
// =============================================================================

/// All offers in display order, including inactive ones.
#[instrument(skip(state))]
pub async fn list_offers(State(state): State<AppState>) -> Result<Json<Vec<OfferEntry>>> {
    Ok(Json(OfferRepository::new(state.pool()).list(false).await?))
}

#[instrument(skip(state, input))]
pub async fn create_offer(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<OfferInput>,
) -> Result<(StatusCode, Json<OfferEntry>)> {
    let offer = OfferRepository::new(state.pool()).create(input).await?;
    Ok((StatusCode::CREATED, Json(offer)))
}

#[instrument(skip(state, input))]
pub async fn update_offer(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OfferId>,
    ApiJson(input): ApiJson<OfferInput>,
) -> Result<Json<OfferEntry>> {
    let offer = OfferRepository::new(state.pool()).update(id, input).await?;
    Ok(Json(offer))
}

#[instrument(skip(state))]
pub async fn delete_offer(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OfferId>,
) -> Result<StatusCode> {
    deleted(OfferRepository::new(state.pool()).delete(id).await?, "Offer")
}
