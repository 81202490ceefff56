//! Storefront offer repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use souk_core::records::{OfferEntry, OfferInput};
use souk_core::{OfferId, ProductId};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct OfferRow {
    id: i32,
    title: String,
    subtitle: Option<String>,
    image_url: String,
    product_id: Option<i32>,
    sort_order: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<OfferRow> for OfferEntry {
    fn from(row: OfferRow) -> Self {
        Self {
            id: OfferId::new(row.id),
            title: row.title,
            subtitle: row.subtitle,
            image_url: row.image_url,
            product_id: row.product_id.map(ProductId::new),
            sort_order: row.sort_order,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

const OFFER_COLUMNS: &str =
    "id, title, subtitle, image_url, product_id, sort_order, is_active, created_at";

fn offer_write_error(e: sqlx::Error) -> RepositoryError {
    if RepositoryError::is_missing_reference(&e) {
        return RepositoryError::NotFound;
    }
    RepositoryError::Database(e)
}

/// Repository for storefront offers.
pub struct OfferRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OfferRepository<'a> {
    /// Create a new offer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Offers in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self, active_only: bool) -> Result<Vec<OfferEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, OfferRow>(&format!(
            r"
            SELECT {OFFER_COLUMNS}
            FROM shop.offer_entry
            WHERE is_active OR NOT $1
            ORDER BY sort_order, id
            "
        ))
        .bind(active_only)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Create an offer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` for bad input and
    /// `RepositoryError::NotFound` if the linked product does not exist.
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: OfferInput) -> Result<OfferEntry, RepositoryError> {
        let input = input.validate()?;
        let row = sqlx::query_as::<_, OfferRow>(&format!(
            r"
            INSERT INTO shop.offer_entry (title, subtitle, image_url, product_id, sort_order, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {OFFER_COLUMNS}
            "
        ))
        .bind(&input.title)
        .bind(input.subtitle.as_deref())
        .bind(&input.image_url)
        .bind(input.product_id)
        .bind(input.sort_order)
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(offer_write_error)?;
        Ok(row.into())
    }

    /// Replace an offer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the offer or the linked product
    /// does not exist.
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: OfferId, input: OfferInput) -> Result<OfferEntry, RepositoryError> {
        let input = input.validate()?;
        let row = sqlx::query_as::<_, OfferRow>(&format!(
            r"
            UPDATE shop.offer_entry
            SET title = $2, subtitle = $3, image_url = $4, product_id = $5,
                sort_order = $6, is_active = $7
            WHERE id = $1
            RETURNING {OFFER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&input.title)
        .bind(input.subtitle.as_deref())
        .bind(&input.image_url)
        .bind(input.product_id)
        .bind(input.sort_order)
        .bind(input.is_active)
        .fetch_optional(self.pool)
        .await
        .map_err(offer_write_error)?
        .ok_or(RepositoryError::NotFound)?;
        Ok(row.into())
    }

    /// Delete an offer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: OfferId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.offer_entry WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
