//! Field-level validation errors for admin and customer input.

use rust_decimal::Decimal;

use crate::{MAX_MONEY, MONEY_SCALE};

/// An input field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Name of the offending field, as it appears in the JSON body.
    pub field: &'static str,
    /// Human readable reason.
    pub message: String,
}

impl ValidationError {
    /// Create a validation error for `field`.
    #[must_use]
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Trim `value` and reject it if nothing is left.
///
/// # Errors
///
/// Returns `ValidationError` when `value` is empty or whitespace only, or longer
/// than `max_len` characters.
pub fn required_text(
    field: &'static str,
    value: &str,
    max_len: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, "is required"));
    }
    if trimmed.chars().count() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {max_len} characters"),
        ));
    }
    Ok(trimmed.to_owned())
}

/// Trim an optional value, mapping blank strings to `None`.
///
/// # Errors
///
/// Returns `ValidationError` when the trimmed value exceeds `max_len` characters.
pub fn optional_text(
    field: &'static str,
    value: Option<&str>,
    max_len: usize,
) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) if v.chars().count() > max_len => Err(ValidationError::new(
            field,
            format!("must be at most {max_len} characters"),
        )),
        Some(v) => Ok(Some(v.to_owned())),
    }
}

/// Check that an amount fits the stored money format.
///
/// # Errors
///
/// Returns `ValidationError` when the amount is larger than `MAX_MONEY` in
/// magnitude or has more than `MONEY_SCALE` decimal places.
pub fn money(field: &'static str, amount: Decimal) -> Result<Decimal, ValidationError> {
    if amount.abs() > MAX_MONEY {
        return Err(ValidationError::new(
            field,
            format!("must be at most {MAX_MONEY}"),
        ));
    }
    if amount.normalize().scale() > MONEY_SCALE {
        return Err(ValidationError::new(
            field,
            format!("must have at most {MONEY_SCALE} decimal places"),
        ));
    }
    Ok(amount)
}
