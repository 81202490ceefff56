//! Customer review repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use souk_core::order::OrderError;
use souk_core::pagination::{Page, PageRequest};
use souk_core::records::{CustomerReview, ReviewInput};
use souk_core::{ProductId, ReviewId};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: i32,
    product_id: Option<i32>,
    customer_name: String,
    rating: i16,
    comment: Option<String>,
    is_approved: bool,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for CustomerReview {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: ReviewId::new(row.id),
            product_id: row.product_id.map(ProductId::new),
            customer_name: row.customer_name,
            rating: row.rating,
            comment: row.comment,
            is_approved: row.is_approved,
            created_at: row.created_at,
        }
    }
}

const REVIEW_COLUMNS: &str = "id, product_id, customer_name, rating, comment, is_approved, created_at";

/// Repository for customer reviews.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Approved reviews, newest first, optionally for one product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_approved(
        &self,
        product_id: Option<ProductId>,
        page: PageRequest,
    ) -> Result<Page<CustomerReview>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            r"
            SELECT {REVIEW_COLUMNS}
            FROM shop.customer_review
            WHERE is_approved AND ($1::INTEGER IS NULL OR product_id = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(product_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM shop.customer_review
            WHERE is_approved AND ($1::INTEGER IS NULL OR product_id = $1)
            ",
        )
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;

        Ok(Page::new(rows.into_iter().map(Into::into).collect(), total, page))
    }

    /// All reviews for moderation, unapproved first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_all(&self, page: PageRequest) -> Result<Page<CustomerReview>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            r"
            SELECT {REVIEW_COLUMNS}
            FROM shop.customer_review
            ORDER BY is_approved, created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shop.customer_review")
            .fetch_one(self.pool)
            .await?;

        Ok(Page::new(rows.into_iter().map(Into::into).collect(), total, page))
    }

    /// Store a review submitted by a customer. It stays hidden until approved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` for bad input and
    /// `RepositoryError::Rejected` with `ProductNotFound` for an unknown product.
    #[instrument(skip(self, input))]
    pub async fn submit(&self, input: ReviewInput) -> Result<CustomerReview, RepositoryError> {
        let input = input.validate()?;
        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            r"
            INSERT INTO shop.customer_review (product_id, customer_name, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING {REVIEW_COLUMNS}
            "
        ))
        .bind(input.product_id)
        .bind(&input.customer_name)
        .bind(input.rating)
        .bind(input.comment.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| match input.product_id {
            Some(product_id) if RepositoryError::is_missing_reference(&e) => {
                OrderError::ProductNotFound(product_id).into()
            }
            _ => RepositoryError::Database(e),
        })?;

        tracing::info!(review_id = row.id, rating = row.rating, "review submitted");
        Ok(row.into())
    }

    /// Mark a review as approved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review does not exist.
    #[instrument(skip(self))]
    pub async fn approve(&self, id: ReviewId) -> Result<CustomerReview, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            r"
            UPDATE shop.customer_review SET is_approved = TRUE
            WHERE id = $1
            RETURNING {REVIEW_COLUMNS}
            "
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;
        Ok(row.into())
    }

    /// Delete a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ReviewId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.customer_review WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
