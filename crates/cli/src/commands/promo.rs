//! Promo code management commands.

use souk_core::promo::PromoCodeInput;
use souk_db::{PromoCodeRepository, RepositoryError};

use super::{CommandError, connect};

/// Validate and insert a promo code.
///
/// # Errors
///
/// Returns an error for invalid input (checked before connecting), a code
/// that already exists, or a database failure.
pub async fn create(input: &PromoCodeInput) -> Result<(), CommandError> {
    let valid = input.validate().map_err(RepositoryError::from)?;

    let pool = connect().await?;
    let promo = PromoCodeRepository::new(&pool).create(&valid).await?;

    tracing::info!(
        id = %promo.id,
        code = %promo.code,
        percentage = promo.percentage.value(),
        valid_until = %promo.valid_until,
        "Promo code created"
    );
    Ok(())
}
