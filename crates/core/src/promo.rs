//! Promo codes.
//!
//! A promo code takes a percentage off the order subtotal while it is active
//! and `now` falls inside `[valid_from, valid_until)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validation::ValidationError;
use crate::{Percentage, PromoCodeId};

const MAX_CODE_LEN: usize = 32;

/// Why a promo code cannot be used right now.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromoRejection {
    #[error("promo code is disabled")]
    Inactive,
    #[error("promo code is valid from {0}")]
    NotYetValid(DateTime<Utc>),
    #[error("promo code expired at {0}")]
    Expired(DateTime<Utc>),
}

/// A stored promo code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoCode {
    pub id: PromoCodeId,
    pub code: String,
    pub percentage: Percentage,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl PromoCode {
    /// Check the code can be applied at `now`, returning its percentage.
    ///
    /// # Errors
    ///
    /// Returns the matching `PromoRejection` when the code is disabled or
    /// outside its validity window.
    pub fn check(&self, now: DateTime<Utc>) -> Result<Percentage, PromoRejection> {
        if !self.is_active {
            return Err(PromoRejection::Inactive);
        }
        if now < self.valid_from {
            return Err(PromoRejection::NotYetValid(self.valid_from));
        }
        if now >= self.valid_until {
            return Err(PromoRejection::Expired(self.valid_until));
        }
        Ok(self.percentage)
    }
}

/// Normalize a code as typed by a customer: trimmed and upper-cased.
#[must_use]
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Body for creating or replacing a promo code.
#[derive(Debug, Clone, Deserialize)]
pub struct PromoCodeInput {
    pub code: String,
    pub percentage: i32,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

/// A promo code input that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidPromoCode {
    pub code: String,
    pub percentage: Percentage,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub is_active: bool,
}

impl PromoCodeInput {
    /// Validate and normalize the input.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a blank or overlong code, a code with
    /// whitespace, a percentage outside 1..=100, or an empty validity window.
    pub fn validate(&self) -> Result<ValidPromoCode, ValidationError> {
        let code = normalize_code(&self.code);
        if code.is_empty() {
            return Err(ValidationError::new("code", "is required"));
        }
        if code.len() > MAX_CODE_LEN || code.chars().any(char::is_whitespace) {
            return Err(ValidationError::new(
                "code",
                format!("must be a single word of at most {MAX_CODE_LEN} characters"),
            ));
        }
        let percentage = Percentage::new(self.percentage)
            .map_err(|e| ValidationError::new("percentage", e.to_string()))?;
        if self.valid_until <= self.valid_from {
            return Err(ValidationError::new(
                "valid_until",
                "must be after valid_from",
            ));
        }
        Ok(ValidPromoCode {
            code,
            percentage,
            valid_from: self.valid_from,
            valid_until: self.valid_until,
            is_active: self.is_active,
        })
    }
}

/// Response to a storefront promo check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoCheck {
    pub code: String,
    pub percentage: Percentage,
    pub valid_until: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn promo(now: DateTime<Utc>) -> PromoCode {
        PromoCode {
            id: PromoCodeId::new(1),
            code: "SPRING10".to_owned(),
            percentage: Percentage::new(10).unwrap(),
            valid_from: now - Duration::days(1),
            valid_until: now + Duration::days(1),
            is_active: true,
            created_at: now,
        }
    }

    #[test]
    fn test_valid_code_returns_percentage() {
        let now = Utc::now();
        assert_eq!(promo(now).check(now).map(Percentage::value), Ok(10));
    }

    #[test]
    fn test_inactive_code_rejected() {
        let now = Utc::now();
        let mut p = promo(now);
        p.is_active = false;
        assert_eq!(p.check(now), Err(PromoRejection::Inactive));
    }

    #[test]
    fn test_window_boundaries() {
        let now = Utc::now();
        let p = promo(now);
        assert!(matches!(
            p.check(p.valid_from - Duration::seconds(1)),
            Err(PromoRejection::NotYetValid(_))
        ));
        assert!(p.check(p.valid_from).is_ok());
        assert!(matches!(
            p.check(p.valid_until),
            Err(PromoRejection::Expired(_))
        ));
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  spring10 "), "SPRING10");
    }

    #[test]
    fn test_input_validation() {
        let now = Utc::now();
        let input = PromoCodeInput {
            code: " summer ".to_owned(),
            percentage: 25,
            valid_from: now,
            valid_until: now + Duration::days(30),
            is_active: true,
        };
        assert_eq!(input.validate().unwrap().code, "SUMMER");

        let bad_pct = PromoCodeInput {
            percentage: 0,
            ..input.clone()
        };
        assert_eq!(bad_pct.validate().unwrap_err().field, "percentage");

        let bad_window = PromoCodeInput {
            valid_until: now,
            ..input.clone()
        };
        assert_eq!(bad_window.validate().unwrap_err().field, "valid_until");

        let spaced = PromoCodeInput {
            code: "two words".to_owned(),
            ..input
        };
        assert_eq!(spaced.validate().unwrap_err().field, "code");
    }
}
