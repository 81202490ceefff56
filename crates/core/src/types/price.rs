//! Money helpers using decimal arithmetic.
//!
//! All amounts are `rust_decimal::Decimal` in the store currency's standard
//! unit, stored as `NUMERIC(12, 2)`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Number of decimal places kept for stored amounts.
pub const MONEY_SCALE: u32 = 2;

/// Largest amount a `NUMERIC(12, 2)` column holds: 9999999999.99.
pub const MAX_MONEY: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, MONEY_SCALE);

/// Round an amount to the stored money scale (banker's rounding).
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp(MONEY_SCALE)
}

/// A discount percentage in the range 1..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Percentage(u8);

/// Error returned when a percentage falls outside 1..=100.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("percentage must be between 1 and 100 (got {0})")]
pub struct PercentageOutOfRange(pub i32);

impl Percentage {
    /// Create a percentage, rejecting values outside 1..=100.
    ///
    /// # Errors
    ///
    /// Returns `PercentageOutOfRange` for zero, negative or >100 values.
    pub fn new(value: i32) -> Result<Self, PercentageOutOfRange> {
        u8::try_from(value)
            .ok()
            .filter(|v| (1..=100).contains(v))
            .map(Self)
            .ok_or(PercentageOutOfRange(value))
    }

    /// The raw value (1..=100).
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// The discount this percentage takes off `amount`, rounded to cents.
    #[must_use]
    pub fn of(self, amount: Decimal) -> Decimal {
        round_money(amount * Decimal::from(self.0) / Decimal::ONE_HUNDRED)
    }
}

impl TryFrom<i32> for Percentage {
    type Error = PercentageOutOfRange;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percentage> for i32 {
    fn from(p: Percentage) -> Self {
        Self::from(p.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_max_money_matches_column() {
        assert_eq!(MAX_MONEY, Decimal::new(999_999_999_999, 2));
        assert_eq!(MAX_MONEY.to_string(), "9999999999.99");
    }

    #[test]
    fn test_percentage_bounds() {
        assert!(Percentage::new(0).is_err());
        assert!(Percentage::new(101).is_err());
        assert!(Percentage::new(-5).is_err());
        assert_eq!(Percentage::new(1).map(Percentage::value), Ok(1));
        assert_eq!(Percentage::new(100).map(Percentage::value), Ok(100));
    }

    #[test]
    fn test_percentage_of_rounds_to_cents() {
        let pct = Percentage::new(15).unwrap();
        // 15% of 33.33 = 4.9995
        assert_eq!(pct.of(Decimal::new(3333, 2)), Decimal::new(500, 2));
    }

    #[test]
    fn test_full_discount_equals_amount() {
        let pct = Percentage::new(100).unwrap();
        assert_eq!(pct.of(Decimal::new(1999, 2)), Decimal::new(1999, 2));
    }

    #[test]
    fn test_percentage_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<Percentage>("0").is_err());
        assert!(serde_json::from_str::<Percentage>("20").is_ok());
    }
}
