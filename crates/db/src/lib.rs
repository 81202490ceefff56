//! Souk DB - `PostgreSQL` repositories shared by the storefront and admin.
//!
//! # Schema: `shop`
//!
//! ## Tables
//!
//! - `product_type`, `product_category`, `product` - Catalog hierarchy
//! - `product_color`, `product_variant` - Per color/size stock
//! - `customer_order`, `order_item` - Orders and line item snapshots
//! - `promo_code`, `delivery_area`, `customer_review`, `offer_entry`
//!
//! # Migrations
//!
//! Migrations are stored in `crates/db/migrations/` and embedded in
//! [`MIGRATOR`]. They run via:
//! ```bash
//! cargo run -p souk-cli -- migrate
//! ```
//!
//! Queries are built at runtime with `sqlx::query_as` and `FromRow` row
//! types, so the workspace compiles without a live database.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod delivery;
pub mod offers;
pub mod orders;
pub mod promos;
pub mod reviews;
pub mod stats;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use souk_core::ValidationError;
use souk_core::order::OrderError;

pub use catalog::CatalogRepository;
pub use delivery::DeliveryAreaRepository;
pub use offers::OfferRepository;
pub use orders::OrderRepository;
pub use promos::PromoCodeRepository;
pub use reviews::ReviewRepository;
pub use stats::{DashboardStats, StatsRepository};

/// Embedded migrations for the `shop` schema.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate promo code).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Input failed validation.
    #[error("invalid input: {0}")]
    Invalid(#[from] ValidationError),

    /// An order workflow refused the request.
    #[error(transparent)]
    Rejected(#[from] OrderError),
}

impl RepositoryError {
    /// Map a write error, turning unique violations into `Conflict(message)`.
    pub(crate) fn on_write(e: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(e)
    }

    /// Whether `e` is a foreign key violation (a referenced row is missing).
    pub(crate) fn is_missing_reference(e: &sqlx::Error) -> bool {
        matches!(e, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Run a cheap query to check the database is reachable.
///
/// # Errors
///
/// Returns `sqlx::Error` if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use souk_core::ProductId;

    #[test]
    fn test_rejected_keeps_order_message() {
        let err = RepositoryError::from(OrderError::ProductNotFound(ProductId::new(3)));
        assert_eq!(err.to_string(), "product 3 not found");
    }

    #[test]
    fn test_invalid_wraps_validation_error() {
        let err = RepositoryError::from(ValidationError::new("name", "is required"));
        assert_eq!(err.to_string(), "invalid input: name: is required");
    }
}
