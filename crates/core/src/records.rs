//! Delivery areas, customer reviews and storefront offers.
//!
//! These are flat records managed from the back office. Each has a stored
//! form and an input form that validates into a normalized copy.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::validation::{ValidationError, money, optional_text, required_text};
use crate::{DeliveryAreaId, OfferId, ProductId, ReviewId};

const MAX_NAME_LEN: usize = 120;
const MAX_COMMENT_LEN: usize = 2000;
const MAX_URL_LEN: usize = 2048;

const fn default_true() -> bool {
    true
}

/// A delivery zone with a flat fee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryArea {
    pub id: DeliveryAreaId,
    pub name: String,
    pub price: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryAreaInput {
    pub name: String,
    pub price: Decimal,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl DeliveryAreaInput {
    /// # Errors
    ///
    /// Returns `ValidationError` for a blank name or a fee that is negative or
    /// does not fit the stored money format.
    pub fn validate(self) -> Result<Self, ValidationError> {
        let price = money("price", self.price)?;
        if price < Decimal::ZERO {
            return Err(ValidationError::new("price", "cannot be negative"));
        }
        Ok(Self {
            name: required_text("name", &self.name, MAX_NAME_LEN)?,
            price,
            is_active: self.is_active,
        })
    }
}

/// A review left by a customer. New reviews wait for approval before they
/// are shown on the storefront.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerReview {
    pub id: ReviewId,
    pub product_id: Option<ProductId>,
    pub customer_name: String,
    pub rating: i16,
    pub comment: Option<String>,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewInput {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    pub customer_name: String,
    pub rating: i16,
    #[serde(default)]
    pub comment: Option<String>,
}

impl ReviewInput {
    pub const MIN_RATING: i16 = 1;
    pub const MAX_RATING: i16 = 5;

    /// # Errors
    ///
    /// Returns `ValidationError` for a blank name, a rating outside 1..=5 or
    /// an overlong comment.
    pub fn validate(self) -> Result<Self, ValidationError> {
        if !(Self::MIN_RATING..=Self::MAX_RATING).contains(&self.rating) {
            return Err(ValidationError::new(
                "rating",
                format!(
                    "must be between {} and {}",
                    Self::MIN_RATING,
                    Self::MAX_RATING
                ),
            ));
        }
        Ok(Self {
            product_id: self.product_id,
            customer_name: required_text("customer_name", &self.customer_name, MAX_NAME_LEN)?,
            rating: self.rating,
            comment: optional_text("comment", self.comment.as_deref(), MAX_COMMENT_LEN)?,
        })
    }
}

/// A promotional banner on the storefront home page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferEntry {
    pub id: OfferId,
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    pub product_id: Option<ProductId>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OfferInput {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    pub image_url: String,
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl OfferInput {
    /// # Errors
    ///
    /// Returns `ValidationError` for a blank title or image URL.
    pub fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            title: required_text("title", &self.title, MAX_NAME_LEN)?,
            subtitle: optional_text("subtitle", self.subtitle.as_deref(), MAX_NAME_LEN)?,
            image_url: required_text("image_url", &self.image_url, MAX_URL_LEN)?,
            product_id: self.product_id,
            sort_order: self.sort_order,
            is_active: self.is_active,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_area_fee_must_be_storable() {
        let area = |price| DeliveryAreaInput {
            name: " Downtown ".to_owned(),
            price,
            is_active: true,
        };
        let ok = area(Decimal::new(12_500, 3)).validate().unwrap();
        assert_eq!(ok.name, "Downtown");
        assert_eq!(ok.price, Decimal::new(1250, 2));

        assert_eq!(area(Decimal::new(12_345, 3)).validate().unwrap_err().field, "price");
        assert_eq!(
            area(Decimal::new(10_000_000_000, 0)).validate().unwrap_err().field,
            "price"
        );
    }

    #[test]
    fn test_delivery_area_negative_fee_rejected() {
        let err = DeliveryAreaInput {
            name: "Suburbs".to_owned(),
            price: Decimal::new(-1, 0),
            is_active: true,
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.field, "price");
    }

    #[test]
    fn test_review_rating_bounds() {
        let review = |rating| ReviewInput {
            product_id: None,
            customer_name: "Dana".to_owned(),
            rating,
            comment: Some("  ".to_owned()),
        };
        assert_eq!(review(0).validate().unwrap_err().field, "rating");
        assert_eq!(review(6).validate().unwrap_err().field, "rating");
        let ok = review(5).validate().unwrap();
        assert_eq!(ok.comment, None);
    }

    #[test]
    fn test_offer_defaults_from_json() {
        let input: OfferInput =
            serde_json::from_str(r#"{"title":"Spring sale","image_url":"/img/spring.jpg"}"#)
                .unwrap();
        assert!(input.is_active);
        assert_eq!(input.sort_order, 0);
        assert!(input.validate().is_ok());
    }
}
