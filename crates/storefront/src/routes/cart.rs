//! Cart quote and promo check route handlers.
//!
//! The cart lives on the client; these endpoints price it against the
//! current catalog without reserving stock.

use axum::{Json, extract::State};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use souk_core::cart::QuoteRequest;
use souk_core::pricing::Quote;
use souk_core::promo::PromoCheck;
use souk_db::{OrderRepository, PromoCodeRepository};

use crate::error::{ApiJson, Result};
use crate::state::AppState;

/// Price cart lines, applying an optional promo code and delivery area.
#[instrument(skip(state, request), fields(lines = request.items.len()))]
pub async fn quote(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<QuoteRequest>,
) -> Result<Json<Quote>> {
    let quote = OrderRepository::new(state.pool()).quote(&request).await?;
    Ok(Json(quote))
}

/// Body of a promo code check.
#[derive(Debug, Deserialize)]
pub struct PromoCheckRequest {
    pub code: String,
}

/// Check that a promo code exists and can be used now.
#[instrument(skip(state))]
pub async fn check_promo(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PromoCheckRequest>,
) -> Result<Json<PromoCheck>> {
    let check = PromoCodeRepository::new(state.pool())
        .check(&request.code, Utc::now())
        .await?;
    Ok(Json(check))
}
