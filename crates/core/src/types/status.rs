//! Status enums for orders.
//!
//! Stored as constrained `TEXT` columns; `as_str` and `FromStr` are the only
//! bridge between the database representation and the enum.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a status string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

/// Lifecycle of an order.
///
/// `Approved` means inventory for every line item has been deducted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Approved,
    Cancelled,
}

impl OrderStatus {
    /// Database / wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether stock has been deducted for this order.
    #[must_use]
    pub const fn holds_stock(self) -> bool {
        matches!(self, Self::Approved)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownVariant {
                kind: "order status",
                value: other.to_owned(),
            }),
        }
    }
}

/// Where an order was created.
///
/// Storefront orders are the customer-facing "store orders"; they wait in
/// `Pending` until an admin confirms them. Admin orders are entered in the
/// back office and deduct stock immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderChannel {
    Admin,
    Storefront,
}

impl OrderChannel {
    /// Database / wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Storefront => "storefront",
        }
    }

    /// Status a freshly created order of this channel starts in.
    #[must_use]
    pub const fn initial_status(self) -> OrderStatus {
        match self {
            Self::Admin => OrderStatus::Approved,
            Self::Storefront => OrderStatus::Pending,
        }
    }
}

impl fmt::Display for OrderChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderChannel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "storefront" => Ok(Self::Storefront),
            other => Err(UnknownVariant {
                kind: "order channel",
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_parse_matches_as_str() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Approved,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_order_status_rejects_unknown() {
        let err = "shipped".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown order status: shipped");
    }

    #[test]
    fn test_only_approved_holds_stock() {
        assert!(OrderStatus::Approved.holds_stock());
        assert!(!OrderStatus::Pending.holds_stock());
        assert!(!OrderStatus::Cancelled.holds_stock());
    }

    #[test]
    fn test_channel_initial_status() {
        assert_eq!(OrderChannel::Admin.initial_status(), OrderStatus::Approved);
        assert_eq!(
            OrderChannel::Storefront.initial_status(),
            OrderStatus::Pending
        );
    }

    #[test]
    fn test_channel_serde_is_snake_case() {
        let json = serde_json::to_string(&OrderChannel::Storefront).unwrap();
        assert_eq!(json, "\"storefront\"");
    }
}
