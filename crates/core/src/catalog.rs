//! Catalog domain models.
//!
//! The catalog is a three-level hierarchy: a `ProductType` (e.g. "Clothing")
//! has categories (e.g. "Dresses"), and each category has products. Stock is
//! tracked per color and size of a product.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::labels_match;
use crate::pricing::unit_price;
use crate::validation::{ValidationError, money, optional_text, required_text};
use crate::{CategoryId, ProductId, ProductTypeId, VariantId};

const MAX_NAME_LEN: usize = 200;
const MAX_CODE_LEN: usize = 64;
const MAX_DESCRIPTION_LEN: usize = 10_000;
const MAX_IMAGES: usize = 20;

/// Most units a single variant may hold.
pub const MAX_VARIANT_STOCK: i32 = 1_000_000;

/// A top-level product type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductType {
    pub id: ProductTypeId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A category inside a product type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub product_type_id: ProductTypeId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A product type with its categories, as shown in navigation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductTypeNode {
    pub id: ProductTypeId,
    pub name: String,
    pub categories: Vec<CategoryNode>,
}

/// A category entry in the catalog tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryNode {
    pub id: CategoryId,
    pub name: String,
    pub product_count: i64,
}

/// Stock for one size of a color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeStock {
    /// Set when read back from the database; ignored on input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    pub size: String,
    pub quantity: i32,
}

/// A color of a product with its per-size stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorVariant {
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub sizes: Vec<SizeStock>,
}

/// A product with its full color/size stock matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub name: String,
    pub code: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    /// Cost price; only exposed by the admin API.
    pub buying_price: Decimal,
    pub images: Vec<String>,
    pub colors: Vec<ColorVariant>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Price a customer pays per unit.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        unit_price(self.price, self.discount_price)
    }

    /// Total units across all colors and sizes.
    #[must_use]
    pub fn total_stock(&self) -> i64 {
        self.colors
            .iter()
            .flat_map(|c| &c.sizes)
            .map(|s| i64::from(s.quantity))
            .sum()
    }

    /// Units available for one color/size, if that variant exists. Labels
    /// match ignoring case.
    #[must_use]
    pub fn stock_of(&self, color: &str, size: &str) -> Option<i32> {
        self.colors
            .iter()
            .find(|c| labels_match(&c.name, color))
            .and_then(|c| c.sizes.iter().find(|s| labels_match(&s.size, size)))
            .map(|s| s.quantity)
    }
}

/// A product as customers see it: the full product without its cost price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorefrontProduct {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub name: String,
    pub code: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub images: Vec<String>,
    pub colors: Vec<ColorVariant>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for StorefrontProduct {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            category_id: product.category_id,
            name: product.name,
            code: product.code,
            description: product.description,
            price: product.price,
            discount_price: product.discount_price,
            images: product.images,
            colors: product.colors,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// A product row in listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub name: String,
    pub code: Option<String>,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub image: Option<String>,
    pub total_stock: i64,
}

/// Filters for product listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    pub type_id: Option<ProductTypeId>,
    pub category_id: Option<CategoryId>,
    /// Case-insensitive match on name or code.
    pub search: Option<String>,
    #[serde(default)]
    pub in_stock_only: bool,
}

impl ProductFilter {
    /// Search term wrapped for an `ILIKE` pattern, or `None` when blank.
    #[must_use]
    pub fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                let escaped = s
                    .replace('\\', "\\\\")
                    .replace('%', "\\%")
                    .replace('_', "\\_");
                format!("%{escaped}%")
            })
    }
}

/// Input for creating or replacing a product.
///
/// `colors` is the complete stock matrix: on replace, variants that are not
/// listed are removed.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub discount_price: Option<Decimal>,
    #[serde(default)]
    pub buying_price: Decimal,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub colors: Vec<ColorVariant>,
}

impl ProductInput {
    /// Validate and normalize the input (trimmed names, blank optionals removed).
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for blank names, non-positive prices, amounts
    /// that do not fit the stored money format, a discount price that is not
    /// below the price, stock outside `0..=MAX_VARIANT_STOCK`, or duplicate
    /// colors/sizes.
    pub fn validate(self) -> Result<Self, ValidationError> {
        let name = required_text("name", &self.name, MAX_NAME_LEN)?;
        let code = optional_text("code", self.code.as_deref(), MAX_CODE_LEN)?;
        let description =
            optional_text("description", self.description.as_deref(), MAX_DESCRIPTION_LEN)?;

        let price = money("price", self.price)?;
        if price <= Decimal::ZERO {
            return Err(ValidationError::new("price", "must be greater than zero"));
        }
        let discount_price = self
            .discount_price
            .map(|d| money("discount_price", d))
            .transpose()?;
        let buying_price = money("buying_price", self.buying_price)?;
        if let Some(discount) = discount_price
            && (discount <= Decimal::ZERO || discount >= price)
        {
            return Err(ValidationError::new(
                "discount_price",
                "must be greater than zero and below price",
            ));
        }
        if buying_price < Decimal::ZERO {
            return Err(ValidationError::new("buying_price", "cannot be negative"));
        }

        let images: Vec<String> = self
            .images
            .iter()
            .map(|i| i.trim().to_owned())
            .filter(|i| !i.is_empty())
            .collect();
        if images.len() > MAX_IMAGES {
            return Err(ValidationError::new(
                "images",
                format!("at most {MAX_IMAGES} images allowed"),
            ));
        }

        let colors = normalize_colors(self.colors)?;

        Ok(Self {
            name,
            code,
            description,
            price,
            discount_price,
            buying_price,
            images,
            colors,
        })
    }
}

fn normalize_colors(colors: Vec<ColorVariant>) -> Result<Vec<ColorVariant>, ValidationError> {
    let mut seen_colors = HashSet::new();
    let mut out = Vec::with_capacity(colors.len());

    for color in colors {
        let name = required_text("colors.name", &color.name, MAX_NAME_LEN)?;
        if !seen_colors.insert(name.to_lowercase()) {
            return Err(ValidationError::new(
                "colors",
                format!("duplicate color '{name}'"),
            ));
        }

        let mut seen_sizes = HashSet::new();
        let mut sizes = Vec::with_capacity(color.sizes.len());
        for size in color.sizes {
            let label = required_text("colors.sizes.size", &size.size, MAX_CODE_LEN)?;
            if !seen_sizes.insert(label.to_lowercase()) {
                return Err(ValidationError::new(
                    "colors.sizes",
                    format!("duplicate size '{label}' for color '{name}'"),
                ));
            }
            if size.quantity < 0 {
                return Err(ValidationError::new(
                    "colors.sizes.quantity",
                    format!("cannot be negative for {name}/{label}"),
                ));
            }
            if size.quantity > MAX_VARIANT_STOCK {
                return Err(ValidationError::new(
                    "colors.sizes.quantity",
                    format!("cannot exceed {MAX_VARIANT_STOCK} for {name}/{label}"),
                ));
            }
            sizes.push(SizeStock {
                variant_id: None,
                size: label,
                quantity: size.quantity,
            });
        }

        out.push(ColorVariant {
            image: optional_text("colors.image", color.image.as_deref(), 2048)?,
            name,
            sizes,
        });
    }

    Ok(out)
}

/// Input for a stock adjustment on a single variant.
#[derive(Debug, Clone, Deserialize)]
pub struct StockAdjustment {
    pub color: String,
    pub size: String,
    /// Units to add (positive) or remove (negative).
    pub delta: i32,
}

impl StockAdjustment {
    /// Check that the adjustment changes stock by a sensible amount.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a zero delta or one larger in magnitude
    /// than `MAX_VARIANT_STOCK`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.delta == 0 {
            return Err(ValidationError::new("delta", "must not be zero"));
        }
        if self.delta.unsigned_abs() > MAX_VARIANT_STOCK.unsigned_abs() {
            return Err(ValidationError::new(
                "delta",
                format!(
                    "cannot change stock by {} units, the limit is {MAX_VARIANT_STOCK}",
                    self.delta.unsigned_abs()
                ),
            ));
        }
        Ok(())
    }
}

/// A variant at or below the low-stock threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowStockEntry {
    pub variant_id: VariantId,
    pub product_id: ProductId,
    pub product_name: String,
    pub color: String,
    pub size: String,
    pub quantity: i32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn size(label: &str, quantity: i32) -> SizeStock {
        SizeStock {
            variant_id: None,
            size: label.to_owned(),
            quantity,
        }
    }

    fn input() -> ProductInput {
        ProductInput {
            name: " Linen Shirt ".to_owned(),
            code: Some("  ".to_owned()),
            description: None,
            price: Decimal::new(4500, 2),
            discount_price: Some(Decimal::new(3900, 2)),
            buying_price: Decimal::new(2000, 2),
            images: vec!["/img/a.jpg".to_owned(), " ".to_owned()],
            colors: vec![ColorVariant {
                name: "White".to_owned(),
                image: None,
                sizes: vec![size("M", 3), size("L", 0)],
            }],
        }
    }

    #[test]
    fn test_validate_normalizes() {
        let product = input().validate().unwrap();
        assert_eq!(product.name, "Linen Shirt");
        assert_eq!(product.code, None);
        assert_eq!(product.images, vec!["/img/a.jpg".to_owned()]);
    }

    #[test]
    fn test_validate_rejects_discount_above_price() {
        let mut bad = input();
        bad.discount_price = Some(Decimal::new(5000, 2));
        let err = bad.validate().unwrap_err();
        assert_eq!(err.field, "discount_price");
    }

    #[test]
    fn test_validate_rejects_unstorable_prices() {
        let mut bad = input();
        bad.price = Decimal::new(99_999_999_999, 0);
        assert_eq!(bad.validate().unwrap_err().field, "price");

        let mut bad = input();
        bad.buying_price = Decimal::new(20_001, 3);
        assert_eq!(bad.validate().unwrap_err().field, "buying_price");
    }

    #[test]
    fn test_validate_rejects_zero_price() {
        let mut bad = input();
        bad.price = Decimal::ZERO;
        assert_eq!(bad.validate().unwrap_err().field, "price");
    }

    #[test]
    fn test_validate_rejects_duplicate_color_case_insensitive() {
        let mut bad = input();
        bad.colors.push(ColorVariant {
            name: "white".to_owned(),
            image: None,
            sizes: vec![],
        });
        assert_eq!(bad.validate().unwrap_err().field, "colors");
    }

    #[test]
    fn test_validate_rejects_negative_stock() {
        let mut bad = input();
        bad.colors[0].sizes.push(size("XL", -1));
        assert_eq!(bad.validate().unwrap_err().field, "colors.sizes.quantity");
    }

    #[test]
    fn test_validate_rejects_stock_over_limit() {
        let mut bad = input();
        bad.colors[0].sizes.push(size("XL", MAX_VARIANT_STOCK + 1));
        assert_eq!(bad.validate().unwrap_err().field, "colors.sizes.quantity");
    }

    #[test]
    fn test_stock_adjustment_bounds() {
        let adjustment = |delta| StockAdjustment {
            color: "White".to_owned(),
            size: "M".to_owned(),
            delta,
        };
        assert!(adjustment(-3).validate().is_ok());
        assert!(adjustment(MAX_VARIANT_STOCK).validate().is_ok());
        assert_eq!(adjustment(0).validate().unwrap_err().field, "delta");
        assert!(adjustment(i32::MAX).validate().is_err());

        let err = adjustment(i32::MIN).validate().unwrap_err();
        assert!(err.message.contains("2147483648"), "{err}");
    }

    fn product() -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(1),
            category_id: CategoryId::new(1),
            name: "Shirt".to_owned(),
            code: None,
            description: None,
            price: Decimal::new(4500, 2),
            discount_price: None,
            buying_price: Decimal::new(2000, 2),
            images: vec![],
            colors: vec![ColorVariant {
                name: "White".to_owned(),
                image: None,
                sizes: vec![size("M", 3), size("L", 4)],
            }],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_stock_queries() {
        let product = product();
        assert_eq!(product.total_stock(), 7);
        assert_eq!(product.stock_of("White", "L"), Some(4));
        assert_eq!(product.stock_of("white", "l"), Some(4));
        assert_eq!(product.stock_of("Black", "L"), None);
        assert_eq!(product.unit_price(), Decimal::new(4500, 2));
    }

    #[test]
    fn test_storefront_product_hides_cost_price() {
        let admin = serde_json::to_value(product()).unwrap();
        assert_eq!(admin["buying_price"], "20.00");

        let public = serde_json::to_value(StorefrontProduct::from(product())).unwrap();
        assert!(public.get("buying_price").is_none());
        assert_eq!(public["price"], "45.00");
        assert_eq!(public["colors"][0]["sizes"][1]["quantity"], 4);
    }

    #[test]
    fn test_search_pattern_escapes_wildcards() {
        let filter = ProductFilter {
            search: Some(" 50%_off ".to_owned()),
            ..ProductFilter::default()
        };
        assert_eq!(filter.search_pattern().as_deref(), Some("%50\\%\\_off%"));

        let blank = ProductFilter {
            search: Some("  ".to_owned()),
            ..ProductFilter::default()
        };
        assert_eq!(blank.search_pattern(), None);
    }
}
