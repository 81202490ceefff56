//! Order management for both channels.
//!
//! Admin-created orders are approved on creation and take stock at once.
//! Store orders arrive `pending` from the storefront and are confirmed or
//! cancelled here.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use souk_core::order::{Order, OrderFilter, OrderSummary, PlaceOrderInput};
use souk_core::pagination::Page;
use souk_core::{OrderChannel, OrderId, OrderStatus};
use souk_db::OrderRepository;

use super::page_request;
use crate::error::{ApiJson, ApiPath, ApiQuery, AppError, Result};
use crate::state::AppState;

/// Query string for order listings.
#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub channel: Option<OrderChannel>,
    pub status: Option<OrderStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OrderListQuery>,
) -> Result<Json<Page<OrderSummary>>> {
    let filter = OrderFilter {
        channel: query.channel,
        status: query.status,
    };
    let orders = OrderRepository::new(state.pool())
        .list(filter, page_request(query.page, query.per_page))
        .await?;
    Ok(Json(orders))
}

/// Create an order on the admin channel. It is approved immediately.
#[instrument(skip(state, input), fields(lines = input.items.len()))]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<PlaceOrderInput>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = OrderRepository::new(state.pool())
        .place(OrderChannel::Admin, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<Order>> {
    OrderRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Order {id} not found")))
}

/// Delete an order record. Stock is not touched.
#[instrument(skip(state))]
pub async fn delete(State(state): State<AppState>, ApiPath(id): ApiPath<OrderId>) -> Result<StatusCode> {
    OrderRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Cancel any order, restocking it if it was approved.
#[instrument(skip(state))]
pub async fn cancel(State(state): State<AppState>, ApiPath(id): ApiPath<OrderId>) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool()).cancel_order(id).await?;
    Ok(Json(order))
}

/// Query string for the store order queue.
#[derive(Debug, Default, Deserialize)]
pub struct StoreOrderQuery {
    pub status: Option<OrderStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Orders placed through the storefront, newest first.
#[instrument(skip(state))]
pub async fn list_store_orders(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StoreOrderQuery>,
) -> Result<Json<Page<OrderSummary>>> {
    let filter = OrderFilter {
        channel: Some(OrderChannel::Storefront),
        status: query.status,
    };
    let orders = OrderRepository::new(state.pool())
        .list(filter, page_request(query.page, query.per_page))
        .await?;
    Ok(Json(orders))
}

/// Approve a pending store order and deduct its stock.
#[instrument(skip(state))]
pub async fn confirm_store_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .confirm_store_order(id)
        .await?;
    Ok(Json(order))
}

#[instrument(skip(state))]
pub async fn cancel_store_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .cancel_store_order(id)
        .await?;
    Ok(Json(order))
}
