//! Line pricing, order totals and cart quotes.
//!
//! Prices always come from the catalog at the time of the request; totals
//! submitted by a client are never used.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{CartLine, VariantKey, labels_match};
use crate::inventory::{StockLevel, StockRequest};
use crate::order::OrderError;
use crate::{MAX_MONEY, Percentage, ProductId, VariantId, round_money};

/// Price a customer pays per unit.
///
/// The discount price only applies when it is positive and below the regular
/// price.
#[must_use]
pub fn unit_price(price: Decimal, discount_price: Option<Decimal>) -> Decimal {
    match discount_price {
        Some(d) if d > Decimal::ZERO && d < price => d,
        _ => price,
    }
}

/// Stock of one variant, as loaded for pricing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantStock {
    pub variant_id: VariantId,
    pub color: String,
    pub size: String,
    pub quantity: i32,
}

/// Everything needed to price and snapshot lines for one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductStock {
    pub product_id: ProductId,
    pub name: String,
    pub code: Option<String>,
    pub image: Option<String>,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub buying_price: Decimal,
    pub variants: Vec<VariantStock>,
}

impl ProductStock {
    /// Stock levels of every variant of this product.
    pub fn levels(&self) -> impl Iterator<Item = StockLevel> + '_ {
        self.variants.iter().map(|v| StockLevel {
            variant_id: v.variant_id,
            key: VariantKey::new(self.product_id, &v.color, &v.size),
            product_name: self.name.clone(),
            available: v.quantity,
        })
    }
}

/// A cart line priced against the catalog, ready to be stored as an order item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub name: String,
    pub code: Option<String>,
    pub image: Option<String>,
    pub color: String,
    pub size: String,
    pub unit_price: Decimal,
    #[serde(skip_serializing, default)]
    pub buying_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
    /// Units in stock when the line was priced.
    pub available: i32,
}

impl PricedLine {
    /// Whether current stock covers the requested quantity.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.available >= self.quantity
    }

    /// The stock this line needs.
    #[must_use]
    pub fn stock_request(&self) -> StockRequest {
        StockRequest {
            key: VariantKey::new(self.product_id, &self.color, &self.size),
            quantity: self.quantity,
        }
    }
}

/// Price `lines` using the loaded catalog snapshots.
///
/// Lines are expected to be normalized (see [`crate::cart::normalize_lines`]).
/// Colors and sizes match the catalog ignoring case; priced lines carry the
/// catalog's spelling.
///
/// # Errors
///
/// - `OrderError::ProductNotFound` when a line references an unknown product
/// - `OrderError::VariantNotFound` when the product has no such color/size
pub fn price_lines(
    lines: &[CartLine],
    products: &[ProductStock],
) -> Result<Vec<PricedLine>, OrderError> {
    lines
        .iter()
        .map(|line| {
            let product = products
                .iter()
                .find(|p| p.product_id == line.product_id)
                .ok_or(OrderError::ProductNotFound(line.product_id))?;

            let key = line.key();
            let variant = product
                .variants
                .iter()
                .find(|v| labels_match(&v.color, &key.color) && labels_match(&v.size, &key.size))
                .ok_or_else(|| OrderError::VariantNotFound {
                    product_id: line.product_id,
                    color: key.color.clone(),
                    size: key.size.clone(),
                })?;

            let unit = unit_price(product.price, product.discount_price);
            Ok(PricedLine {
                product_id: product.product_id,
                variant_id: variant.variant_id,
                name: product.name.clone(),
                code: product.code.clone(),
                image: product.image.clone(),
                color: variant.color.clone(),
                size: variant.size.clone(),
                unit_price: unit,
                buying_price: product.buying_price,
                quantity: line.quantity,
                line_total: round_money(unit * Decimal::from(line.quantity)),
                available: variant.quantity,
            })
        })
        .collect()
}

/// Monetary totals of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// Compute totals. The promo discount applies to the subtotal only; the
    /// delivery fee is added afterwards.
    #[must_use]
    pub fn compute(lines: &[PricedLine], promo: Option<Percentage>, delivery_fee: Decimal) -> Self {
        let subtotal: Decimal = lines.iter().map(|l| l.line_total).sum();
        let discount = promo.map_or(Decimal::ZERO, |p| p.of(subtotal));
        let delivery_fee = round_money(delivery_fee);
        Self {
            subtotal,
            discount,
            delivery_fee,
            total: subtotal - discount + delivery_fee,
        }
    }

    /// Check that every line total and the order totals fit the stored money
    /// format.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::AmountTooLarge` when any amount exceeds `MAX_MONEY`.
    pub fn ensure_storable(&self, lines: &[PricedLine]) -> Result<(), OrderError> {
        let largest = lines
            .iter()
            .map(|l| l.line_total)
            .chain([self.subtotal, self.delivery_fee, self.total])
            .max()
            .unwrap_or_default();
        if largest > MAX_MONEY {
            return Err(OrderError::AmountTooLarge { max: MAX_MONEY });
        }
        Ok(())
    }
}

/// A priced cart, returned to the storefront before checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub lines: Vec<QuoteLine>,
    pub promo_percentage: Option<Percentage>,
    pub totals: OrderTotals,
    /// False when any line asks for more than is in stock.
    pub all_in_stock: bool,
}

/// One line of a [`Quote`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteLine {
    #[serde(flatten)]
    pub line: PricedLine,
    pub in_stock: bool,
}

impl Quote {
    /// Build a quote from priced lines.
    #[must_use]
    pub fn new(lines: Vec<PricedLine>, promo: Option<Percentage>, delivery_fee: Decimal) -> Self {
        let totals = OrderTotals::compute(&lines, promo, delivery_fee);
        let lines: Vec<QuoteLine> = lines
            .into_iter()
            .map(|line| QuoteLine {
                in_stock: line.in_stock(),
                line,
            })
            .collect();
        Self {
            all_in_stock: lines.iter().all(|l| l.in_stock),
            lines,
            promo_percentage: promo,
            totals,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn catalog() -> Vec<ProductStock> {
        vec![
            ProductStock {
                product_id: ProductId::new(1),
                name: "Linen Shirt".to_owned(),
                code: Some("LS-01".to_owned()),
                image: Some("/img/ls.jpg".to_owned()),
                price: Decimal::new(4500, 2),
                discount_price: Some(Decimal::new(3999, 2)),
                buying_price: Decimal::new(2000, 2),
                variants: vec![
                    VariantStock {
                        variant_id: VariantId::new(10),
                        color: "White".to_owned(),
                        size: "M".to_owned(),
                        quantity: 5,
                    },
                    VariantStock {
                        variant_id: VariantId::new(11),
                        color: "White".to_owned(),
                        size: "L".to_owned(),
                        quantity: 1,
                    },
                ],
            },
            ProductStock {
                product_id: ProductId::new(2),
                name: "Wool Scarf".to_owned(),
                code: None,
                image: None,
                price: Decimal::new(1250, 2),
                discount_price: None,
                buying_price: Decimal::new(500, 2),
                variants: vec![VariantStock {
                    variant_id: VariantId::new(20),
                    color: "Grey".to_owned(),
                    size: "One".to_owned(),
                    quantity: 0,
                }],
            },
        ]
    }

    fn line(product: i32, color: &str, size: &str, quantity: i32) -> CartLine {
        CartLine {
            product_id: ProductId::new(product),
            color: color.to_owned(),
            size: size.to_owned(),
            quantity,
        }
    }

    #[test]
    fn test_unit_price_ignores_invalid_discount() {
        let price = Decimal::new(1000, 2);
        assert_eq!(unit_price(price, None), price);
        assert_eq!(unit_price(price, Some(Decimal::new(800, 2))), Decimal::new(800, 2));
        assert_eq!(unit_price(price, Some(Decimal::new(1200, 2))), price);
        assert_eq!(unit_price(price, Some(Decimal::ZERO)), price);
    }

    #[test]
    fn test_price_lines_snapshots_catalog() {
        let priced = price_lines(&[line(1, "White", "M", 2)], &catalog()).unwrap();
        let first = &priced[0];
        assert_eq!(first.variant_id, VariantId::new(10));
        assert_eq!(first.unit_price, Decimal::new(3999, 2));
        assert_eq!(first.line_total, Decimal::new(7998, 2));
        assert_eq!(first.buying_price, Decimal::new(2000, 2));
        assert_eq!(first.code.as_deref(), Some("LS-01"));
        assert!(first.in_stock());
    }

    #[test]
    fn test_price_lines_match_labels_ignoring_case() {
        let priced = price_lines(&[line(1, "white", "l", 1)], &catalog()).unwrap();
        assert_eq!(priced[0].variant_id, VariantId::new(11));
        assert_eq!(priced[0].color, "White");
        assert_eq!(priced[0].size, "L");
        assert_eq!(priced[0].stock_request().key, VariantKey::new(ProductId::new(1), "White", "L"));
    }

    #[test]
    fn test_price_lines_unknown_product() {
        let err = price_lines(&[line(9, "White", "M", 1)], &catalog()).unwrap_err();
        assert_eq!(err, OrderError::ProductNotFound(ProductId::new(9)));
    }

    #[test]
    fn test_price_lines_unknown_variant() {
        let err = price_lines(&[line(1, "Black", "M", 1)], &catalog()).unwrap_err();
        assert!(matches!(err, OrderError::VariantNotFound { .. }));
    }

    #[test]
    fn test_totals_apply_promo_before_delivery() {
        let priced = price_lines(
            &[line(1, "White", "M", 2), line(2, "Grey", "One", 1)],
            &catalog(),
        )
        .unwrap();
        let totals = OrderTotals::compute(
            &priced,
            Some(Percentage::new(10).unwrap()),
            Decimal::new(500, 2),
        );
        // 79.98 + 12.50 = 92.48; 10% = 9.248 -> 9.25
        assert_eq!(totals.subtotal, Decimal::new(9248, 2));
        assert_eq!(totals.discount, Decimal::new(925, 2));
        assert_eq!(totals.delivery_fee, Decimal::new(500, 2));
        assert_eq!(totals.total, Decimal::new(8823, 2));
    }

    #[test]
    fn test_totals_beyond_money_column_rejected() {
        let mut products = catalog();
        products[0].price = MAX_MONEY;
        products[0].discount_price = None;
        let priced = price_lines(&[line(1, "White", "M", 1)], &products).unwrap();
        let totals = OrderTotals::compute(&priced, None, Decimal::ZERO);
        assert!(totals.ensure_storable(&priced).is_ok());

        let priced = price_lines(&[line(1, "White", "M", 2)], &products).unwrap();
        let totals = OrderTotals::compute(&priced, None, Decimal::ZERO);
        assert!(matches!(
            totals.ensure_storable(&priced),
            Err(OrderError::AmountTooLarge { .. })
        ));
    }

    #[test]
    fn test_quote_flags_out_of_stock_lines() {
        let priced = price_lines(
            &[line(1, "White", "L", 2), line(2, "Grey", "One", 1)],
            &catalog(),
        )
        .unwrap();
        let quote = Quote::new(priced, None, Decimal::ZERO);
        assert!(!quote.all_in_stock);
        assert!(quote.lines.iter().all(|l| !l.in_stock));
        assert_eq!(quote.totals.discount, Decimal::ZERO);
    }

    #[test]
    fn test_buying_price_not_serialized() {
        let priced = price_lines(&[line(1, "White", "M", 1)], &catalog()).unwrap();
        let json = serde_json::to_value(&priced[0]).unwrap();
        assert!(json.get("buying_price").is_none());
        assert!(json.get("unit_price").is_some());
    }
}
