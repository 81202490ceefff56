//! Cart lines.
//!
//! The cart itself lives on the client. The server only ever sees a list of
//! lines when quoting or placing an order, and normalizes them first.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::order::OrderError;
use crate::{DeliveryAreaId, ProductId};

/// Maximum number of distinct lines in one cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line.
pub const MAX_LINE_QUANTITY: i32 = 999;

/// One line of a cart: a product in a given color and size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub color: String,
    pub size: String,
    pub quantity: i32,
}

/// Body of a cart quote request: the lines plus optional promo code and
/// delivery area.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteRequest {
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub promo_code: Option<String>,
    #[serde(default)]
    pub delivery_area_id: Option<DeliveryAreaId>,
}

/// Identifies a stock cell: product + color + size.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantKey {
    pub product_id: ProductId,
    pub color: String,
    pub size: String,
}

impl VariantKey {
    /// Build a key, trimming the color and size labels.
    #[must_use]
    pub fn new(product_id: ProductId, color: &str, size: &str) -> Self {
        Self {
            product_id,
            color: color.trim().to_owned(),
            size: size.trim().to_owned(),
        }
    }

    /// The key with lowercased labels. Two keys with the same folded form
    /// name the same stock cell.
    #[must_use]
    pub fn folded(&self) -> Self {
        Self {
            product_id: self.product_id,
            color: self.color.to_lowercase(),
            size: self.size.to_lowercase(),
        }
    }

    /// Whether both keys name the same stock cell, ignoring label case.
    #[must_use]
    pub fn same_cell(&self, other: &Self) -> bool {
        self.product_id == other.product_id
            && labels_match(&self.color, &other.color)
            && labels_match(&self.size, &other.size)
    }
}

/// Color and size labels compare case-insensitively.
#[must_use]
pub fn labels_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

impl CartLine {
    /// The stock cell this line draws from.
    #[must_use]
    pub fn key(&self) -> VariantKey {
        VariantKey::new(self.product_id, &self.color, &self.size)
    }
}

/// Validate cart lines and merge duplicates.
///
/// Lines for the same product/color/size are combined by summing their
/// quantities; labels are matched ignoring case and the first spelling is
/// kept. The output is ordered by product, color and size so that
/// downstream row locking happens in a stable order.
///
/// # Errors
///
/// - `OrderError::EmptyCart` when there are no lines
/// - `OrderError::InvalidQuantity` when a line (or a merged line) is outside
///   `1..=MAX_LINE_QUANTITY`
/// - `OrderError::TooManyLines` when more than `MAX_CART_LINES` distinct lines remain
pub fn normalize_lines(lines: &[CartLine]) -> Result<Vec<CartLine>, OrderError> {
    if lines.is_empty() {
        return Err(OrderError::EmptyCart);
    }

    let mut merged: BTreeMap<VariantKey, CartLine> = BTreeMap::new();
    for line in lines {
        if !(1..=MAX_LINE_QUANTITY).contains(&line.quantity) {
            return Err(OrderError::InvalidQuantity {
                product_id: line.product_id,
                quantity: line.quantity,
            });
        }
        let key = line.key();
        let entry = merged.entry(key.folded()).or_insert_with(|| CartLine {
            product_id: key.product_id,
            color: key.color,
            size: key.size,
            quantity: 0,
        });
        entry.quantity += line.quantity;
        if entry.quantity > MAX_LINE_QUANTITY {
            return Err(OrderError::InvalidQuantity {
                product_id: line.product_id,
                quantity: entry.quantity,
            });
        }
    }

    if merged.len() > MAX_CART_LINES {
        return Err(OrderError::TooManyLines {
            max: MAX_CART_LINES,
        });
    }

    Ok(merged.into_values().collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(product: i32, color: &str, size: &str, quantity: i32) -> CartLine {
        CartLine {
            product_id: ProductId::new(product),
            color: color.to_owned(),
            size: size.to_owned(),
            quantity,
        }
    }

    #[test]
    fn test_empty_cart_rejected() {
        assert!(matches!(normalize_lines(&[]), Err(OrderError::EmptyCart)));
    }

    #[test]
    fn test_duplicate_lines_are_merged() {
        let lines = normalize_lines(&[
            line(2, "Red", "M", 1),
            line(1, "Blue", "S", 2),
            line(2, " Red ", "M ", 3),
        ])
        .unwrap();

        assert_eq!(
            lines,
            vec![line(1, "Blue", "S", 2), line(2, "Red", "M", 4)]
        );
    }

    #[test]
    fn test_lines_differing_in_case_are_merged() {
        let lines = normalize_lines(&[line(1, "Red", "m", 1), line(1, "RED", "M", 2)]).unwrap();
        assert_eq!(lines, vec![line(1, "Red", "m", 3)]);
        assert!(VariantKey::new(ProductId::new(1), "red", "M").same_cell(&lines[0].key()));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let err = normalize_lines(&[line(1, "Red", "M", 0)]).unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidQuantity { quantity: 0, .. }
        ));
    }

    #[test]
    fn test_merged_quantity_over_limit_rejected() {
        let err = normalize_lines(&[
            line(1, "Red", "M", MAX_LINE_QUANTITY),
            line(1, "Red", "M", 1),
        ])
        .unwrap_err();
        assert!(matches!(err, OrderError::InvalidQuantity { .. }));
    }

    #[test]
    fn test_too_many_lines_rejected() {
        let lines: Vec<CartLine> = (0..=i32::try_from(MAX_CART_LINES).unwrap())
            .map(|i| line(i, "Red", "M", 1))
            .collect();
        assert!(matches!(
            normalize_lines(&lines),
            Err(OrderError::TooManyLines { .. })
        ));
    }
}
