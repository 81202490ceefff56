//! Stock deduction planning.
//!
//! The database layer locks the variant rows an order touches, loads them as
//! [`StockLevel`]s and asks [`plan_deductions`] what to subtract. Nothing is
//! written unless every request can be covered.

use std::collections::BTreeMap;

use crate::cart::VariantKey;
use crate::order::OrderError;
use crate::VariantId;

/// Units wanted from one stock cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockRequest {
    pub key: VariantKey,
    pub quantity: i32,
}

/// Current stock of one variant row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLevel {
    pub variant_id: VariantId,
    pub key: VariantKey,
    pub product_name: String,
    pub available: i32,
}

/// A change to apply to one variant row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDeduction {
    pub variant_id: VariantId,
    pub key: VariantKey,
    pub quantity: i32,
}

/// Decide how much to subtract from each variant.
///
/// Requests for the same cell are summed before comparing against the
/// available quantity. The result is sorted by variant id, which is also the
/// order rows must be updated in.
///
/// # Errors
///
/// - `OrderError::VariantNotFound` when a request has no matching level
/// - `OrderError::InsufficientStock` when the summed request exceeds stock
pub fn plan_deductions(
    requests: &[StockRequest],
    levels: &[StockLevel],
) -> Result<Vec<StockDeduction>, OrderError> {
    let mut wanted: BTreeMap<&VariantKey, i32> = BTreeMap::new();
    for request in requests {
        *wanted.entry(&request.key).or_insert(0) += request.quantity;
    }

    let mut plan = Vec::with_capacity(wanted.len());
    for (key, quantity) in wanted {
        let level = levels
            .iter()
            .find(|l| l.key.same_cell(key))
            .ok_or_else(|| OrderError::VariantNotFound {
                product_id: key.product_id,
                color: key.color.clone(),
                size: key.size.clone(),
            })?;
        if level.available < quantity {
            return Err(OrderError::InsufficientStock {
                product_id: key.product_id,
                name: level.product_name.clone(),
                color: key.color.clone(),
                size: key.size.clone(),
                requested: quantity,
                available: level.available,
            });
        }
        plan.push(StockDeduction {
            variant_id: level.variant_id,
            key: key.clone(),
            quantity,
        });
    }

    plan.sort_by_key(|d| d.variant_id);
    Ok(plan)
}

/// Quantities to put back when an approved order is cancelled.
///
/// Requests whose variant no longer exists are skipped: there is no row left
/// to return the units to.
#[must_use]
pub fn restock_plan(requests: &[StockRequest], levels: &[StockLevel]) -> Vec<StockDeduction> {
    let mut returned: BTreeMap<VariantId, StockDeduction> = BTreeMap::new();
    for request in requests {
        let Some(level) = levels.iter().find(|l| l.key.same_cell(&request.key)) else {
            continue;
        };
        returned
            .entry(level.variant_id)
            .and_modify(|d| d.quantity += request.quantity)
            .or_insert_with(|| StockDeduction {
                variant_id: level.variant_id,
                key: level.key.clone(),
                quantity: request.quantity,
            });
    }
    returned.into_values().collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ProductId;

    fn key(product: i32, color: &str, size: &str) -> VariantKey {
        VariantKey::new(ProductId::new(product), color, size)
    }

    fn level(id: i32, product: i32, color: &str, size: &str, available: i32) -> StockLevel {
        StockLevel {
            variant_id: VariantId::new(id),
            key: key(product, color, size),
            product_name: format!("Product {product}"),
            available,
        }
    }

    fn request(product: i32, color: &str, size: &str, quantity: i32) -> StockRequest {
        StockRequest {
            key: key(product, color, size),
            quantity,
        }
    }

    #[test]
    fn test_plan_sorted_by_variant() {
        let levels = [level(7, 1, "Red", "M", 3), level(2, 2, "Blue", "S", 4)];
        let plan =
            plan_deductions(&[request(1, "Red", "M", 2), request(2, "Blue", "S", 4)], &levels)
                .unwrap();
        let ids: Vec<i32> = plan.iter().map(|d| d.variant_id.as_i32()).collect();
        assert_eq!(ids, vec![2, 7]);
        assert_eq!(plan[0].quantity, 4);
    }

    #[test]
    fn test_exact_stock_allowed() {
        let levels = [level(1, 1, "Red", "M", 2)];
        assert!(plan_deductions(&[request(1, "Red", "M", 2)], &levels).is_ok());
    }

    #[test]
    fn test_oversell_rejected_after_summing() {
        let levels = [level(1, 1, "Red", "M", 3)];
        let err = plan_deductions(
            &[request(1, "Red", "M", 2), request(1, "Red", "M", 2)],
            &levels,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            OrderError::InsufficientStock {
                requested: 4,
                available: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_variant_rejected() {
        let levels = [level(1, 1, "Red", "M", 3)];
        let err = plan_deductions(&[request(1, "Red", "XL", 1)], &levels).unwrap_err();
        assert!(matches!(err, OrderError::VariantNotFound { .. }));
    }

    #[test]
    fn test_restock_skips_deleted_variants() {
        let levels = [level(5, 1, "Red", "M", 0)];
        let plan = restock_plan(
            &[
                request(1, "Red", "M", 2),
                request(1, "Green", "M", 1),
                request(1, "Red", "M", 1),
            ],
            &levels,
        );
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].variant_id, VariantId::new(5));
        assert_eq!(plan[0].quantity, 3);
    }
}
