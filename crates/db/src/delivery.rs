//! Delivery area repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use souk_core::DeliveryAreaId;
use souk_core::records::{DeliveryArea, DeliveryAreaInput};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct DeliveryAreaRow {
    id: i32,
    name: String,
    price: Decimal,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<DeliveryAreaRow> for DeliveryArea {
    fn from(row: DeliveryAreaRow) -> Self {
        Self {
            id: DeliveryAreaId::new(row.id),
            name: row.name,
            price: row.price,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

/// Repository for delivery areas.
pub struct DeliveryAreaRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DeliveryAreaRepository<'a> {
    /// Create a new delivery area repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Delivery areas ordered by name. With `active_only`, disabled areas are
    /// left out.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self, active_only: bool) -> Result<Vec<DeliveryArea>, RepositoryError> {
        let rows = sqlx::query_as::<_, DeliveryAreaRow>(
            r"
            SELECT id, name, price, is_active, created_at
            FROM shop.delivery_area
            WHERE is_active OR NOT $1
            ORDER BY name
            ",
        )
        .bind(active_only)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Create a delivery area.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` for bad input,
    /// `RepositoryError::Conflict` if the name is taken.
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: DeliveryAreaInput) -> Result<DeliveryArea, RepositoryError> {
        let input = input.validate()?;
        let row = sqlx::query_as::<_, DeliveryAreaRow>(
            r"
            INSERT INTO shop.delivery_area (name, price, is_active)
            VALUES ($1, $2, $3)
            RETURNING id, name, price, is_active, created_at
            ",
        )
        .bind(&input.name)
        .bind(input.price)
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::on_write(e, "delivery area already exists"))?;
        Ok(row.into())
    }

    /// Replace a delivery area.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the area does not exist.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: DeliveryAreaId,
        input: DeliveryAreaInput,
    ) -> Result<DeliveryArea, RepositoryError> {
        let input = input.validate()?;
        let row = sqlx::query_as::<_, DeliveryAreaRow>(
            r"
            UPDATE shop.delivery_area
            SET name = $2, price = $3, is_active = $4
            WHERE id = $1
            RETURNING id, name, price, is_active, created_at
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.price)
        .bind(input.is_active)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::on_write(e, "delivery area already exists"))?
        .ok_or(RepositoryError::NotFound)?;
        Ok(row.into())
    }

    /// Delete a delivery area. Orders referencing it keep their fee.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: DeliveryAreaId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.delivery_area WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
