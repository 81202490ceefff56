//! Store order placement.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use souk_core::OrderChannel;
use souk_core::order::{OrderReceipt, PlaceOrderInput};
use souk_db::OrderRepository;

use crate::error::{ApiJson, Result};
use crate::state::AppState;

/// Place a store order. It stays `pending` until an admin confirms it.
#[instrument(skip(state, input), fields(lines = input.items.len()))]
pub async fn place(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<PlaceOrderInput>,
) -> Result<(StatusCode, Json<OrderReceipt>)> {
    let order = OrderRepository::new(state.pool())
        .place(OrderChannel::Storefront, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(OrderReceipt::from(&order))))
}
