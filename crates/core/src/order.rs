//! Order domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::CartLine;
use crate::contact::CustomerInfo;
use crate::promo::PromoRejection;
use crate::validation::ValidationError;
use crate::{DeliveryAreaId, OrderChannel, OrderId, OrderItemId, OrderStatus, ProductId};

/// Business-rule failures while pricing, placing or confirming an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("cart has more than {max} lines")]
    TooManyLines { max: usize },

    #[error("invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: ProductId, quantity: i32 },

    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    #[error("product {product_id} has no color '{color}' in size '{size}'")]
    VariantNotFound {
        product_id: ProductId,
        color: String,
        size: String,
    },

    #[error(
        "not enough stock for {name} ({color}/{size}): requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        name: String,
        color: String,
        size: String,
        requested: i32,
        available: i32,
    },

    #[error("promo code '{0}' not found")]
    UnknownPromoCode(String),

    #[error("promo code rejected: {0}")]
    PromoRejected(#[from] PromoRejection),

    #[error("delivery area {0} is not available")]
    DeliveryAreaUnavailable(DeliveryAreaId),

    #[error("invalid customer details: {0}")]
    InvalidCustomer(#[from] ValidationError),

    #[error("order {0} is already confirmed")]
    AlreadyConfirmed(OrderId),

    #[error("order {0} is already cancelled")]
    AlreadyCancelled(OrderId),

    #[error("order {0} was not placed on the storefront")]
    NotAStoreOrder(OrderId),

    #[error("'{name}' is no longer in the catalog")]
    ProductRemoved { name: String },

    #[error("order amounts exceed {max}")]
    AmountTooLarge { max: Decimal },
}

impl OrderError {
    /// Whether the error refers to something that does not exist (HTTP 404)
    /// rather than a request that breaks a rule (HTTP 400).
    #[must_use]
    pub const fn is_missing_resource(&self) -> bool {
        matches!(
            self,
            Self::ProductNotFound(_)
                | Self::VariantNotFound { .. }
                | Self::UnknownPromoCode(_)
                | Self::NotAStoreOrder(_)
        )
    }
}

/// Body for placing an order on either channel.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrderInput {
    pub customer: CustomerInfo,
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub promo_code: Option<String>,
    #[serde(default)]
    pub delivery_area_id: Option<DeliveryAreaId>,
}

/// A line item with the product details captured at order time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    /// `None` once the product has been deleted from the catalog.
    pub product_id: Option<ProductId>,
    pub name: String,
    pub code: Option<String>,
    pub image: Option<String>,
    pub color: String,
    pub size: String,
    pub unit_price: Decimal,
    pub buying_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

/// A full order with its line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub channel: OrderChannel,
    pub status: OrderStatus,
    pub customer_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: String,
    pub city: Option<String>,
    pub note: Option<String>,
    pub delivery_area_id: Option<DeliveryAreaId>,
    pub promo_code: Option<String>,
    pub promo_percentage: Option<i32>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// An order row in listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub channel: OrderChannel,
    pub status: OrderStatus,
    pub customer_name: String,
    pub phone: String,
    pub total: Decimal,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Filters for order listings.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct OrderFilter {
    pub channel: Option<OrderChannel>,
    pub status: Option<OrderStatus>,
}

/// Receipt returned to a customer after placing a store order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub id: OrderId,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<&Order> for OrderReceipt {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            status: order.status,
            subtotal: order.subtotal,
            discount: order.discount,
            delivery_fee: order.delivery_fee,
            total: order.total,
            created_at: order.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_resource_classification() {
        assert!(OrderError::ProductNotFound(ProductId::new(1)).is_missing_resource());
        assert!(OrderError::UnknownPromoCode("X".to_owned()).is_missing_resource());
        assert!(!OrderError::EmptyCart.is_missing_resource());
        assert!(!OrderError::AlreadyConfirmed(OrderId::new(1)).is_missing_resource());
    }

    #[test]
    fn test_insufficient_stock_message() {
        let err = OrderError::InsufficientStock {
            product_id: ProductId::new(4),
            name: "Scarf".to_owned(),
            color: "Red".to_owned(),
            size: "One".to_owned(),
            requested: 3,
            available: 1,
        };
        assert_eq!(
            err.to_string(),
            "not enough stock for Scarf (Red/One): requested 3, available 1"
        );
    }
}
