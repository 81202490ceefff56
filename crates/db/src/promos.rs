//! Promo code repository.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use souk_core::order::OrderError;
use souk_core::promo::{PromoCheck, PromoCode, ValidPromoCode, normalize_code};
use souk_core::{Percentage, PromoCodeId};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct PromoCodeRow {
    id: i32,
    code: String,
    percentage: i32,
    valid_from: DateTime<Utc>,
    valid_until: DateTime<Utc>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<PromoCodeRow> for PromoCode {
    type Error = RepositoryError;

    fn try_from(row: PromoCodeRow) -> Result<Self, Self::Error> {
        let percentage = Percentage::new(row.percentage).map_err(|e| {
            RepositoryError::DataCorruption(format!("promo code {}: {e}", row.id))
        })?;
        Ok(Self {
            id: PromoCodeId::new(row.id),
            code: row.code,
            percentage,
            valid_from: row.valid_from,
            valid_until: row.valid_until,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

const PROMO_COLUMNS: &str = "id, code, percentage, valid_from, valid_until, is_active, created_at";

/// Look up a promo code by its normalized form.
pub(crate) async fn find_promo(
    conn: &mut PgConnection,
    code: &str,
) -> Result<Option<PromoCode>, RepositoryError> {
    sqlx::query_as::<_, PromoCodeRow>(&format!(
        "SELECT {PROMO_COLUMNS} FROM shop.promo_code WHERE code = $1"
    ))
    .bind(code)
    .fetch_optional(&mut *conn)
    .await?
    .map(PromoCode::try_from)
    .transpose()
}

/// Repository for promo codes.
pub struct PromoCodeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PromoCodeRepository<'a> {
    /// Create a new promo code repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All promo codes, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<PromoCode>, RepositoryError> {
        sqlx::query_as::<_, PromoCodeRow>(&format!(
            "SELECT {PROMO_COLUMNS} FROM shop.promo_code ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(PromoCode::try_from)
        .collect()
    }

    /// Check a code typed by a customer at `now`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Rejected` with `UnknownPromoCode` or
    /// `PromoRejected`.
    #[instrument(skip(self))]
    pub async fn check(
        &self,
        raw_code: &str,
        now: DateTime<Utc>,
    ) -> Result<PromoCheck, RepositoryError> {
        let code = normalize_code(raw_code);
        let mut conn = self.pool.acquire().await?;
        let promo = find_promo(&mut *conn, &code)
            .await?
            .ok_or_else(|| OrderError::UnknownPromoCode(code.clone()))?;
        let percentage = promo.check(now).map_err(OrderError::from)?;
        Ok(PromoCheck {
            code: promo.code,
            percentage,
            valid_until: promo.valid_until,
        })
    }

    /// Create a promo code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code already exists.
    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create(&self, input: &ValidPromoCode) -> Result<PromoCode, RepositoryError> {
        sqlx::query_as::<_, PromoCodeRow>(&format!(
            r"
            INSERT INTO shop.promo_code (code, percentage, valid_from, valid_until, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PROMO_COLUMNS}
            "
        ))
        .bind(&input.code)
        .bind(i32::from(input.percentage))
        .bind(input.valid_from)
        .bind(input.valid_until)
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::on_write(e, "promo code already exists"))?
        .try_into()
    }

    /// Replace a promo code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the promo code does not exist,
    /// `RepositoryError::Conflict` if the new code is taken.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: PromoCodeId,
        input: &ValidPromoCode,
    ) -> Result<PromoCode, RepositoryError> {
        sqlx::query_as::<_, PromoCodeRow>(&format!(
            r"
            UPDATE shop.promo_code
            SET code = $2, percentage = $3, valid_from = $4, valid_until = $5, is_active = $6
            WHERE id = $1
            RETURNING {PROMO_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&input.code)
        .bind(i32::from(input.percentage))
        .bind(input.valid_from)
        .bind(input.valid_until)
        .bind(input.is_active)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::on_write(e, "promo code already exists"))?
        .ok_or(RepositoryError::NotFound)?
        .try_into()
    }

    /// Delete a promo code. Orders keep the code text they were placed with.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: PromoCodeId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.promo_code WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
