//! Dashboard statistics.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;

use souk_core::OrderStatus;

use super::RepositoryError;

/// Summary numbers for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub pending_orders: i64,
    pub approved_orders: i64,
    pub cancelled_orders: i64,
    /// Sum of totals of approved orders.
    pub revenue: Decimal,
    /// `(unit_price - buying_price) * quantity` over approved order items.
    pub gross_profit: Decimal,
    /// Variants at or below the low-stock threshold.
    pub low_stock_variants: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct StatusCountRow {
    status: String,
    count: i64,
}

/// Repository for aggregate queries.
pub struct StatsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StatsRepository<'a> {
    /// Create a new stats repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Compute the dashboard summary.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails, or
    /// `RepositoryError::DataCorruption` for an unknown order status.
    #[instrument(skip(self))]
    pub async fn dashboard(&self, low_stock_threshold: i32) -> Result<DashboardStats, RepositoryError> {
        let mut stats = DashboardStats::default();

        let counts = sqlx::query_as::<_, StatusCountRow>(
            "SELECT status, COUNT(*) AS count FROM shop.customer_order GROUP BY status",
        )
        .fetch_all(self.pool)
        .await?;
        for row in counts {
            let status: OrderStatus = row
                .status
                .parse()
                .map_err(|e| RepositoryError::DataCorruption(format!("{e}")))?;
            match status {
                OrderStatus::Pending => stats.pending_orders = row.count,
                OrderStatus::Approved => stats.approved_orders = row.count,
                OrderStatus::Cancelled => stats.cancelled_orders = row.count,
            }
        }

        stats.revenue = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total), 0) FROM shop.customer_order WHERE status = $1",
        )
        .bind(OrderStatus::Approved.as_str())
        .fetch_one(self.pool)
        .await?;

        stats.gross_profit = sqlx::query_scalar(
            r"
            SELECT COALESCE(SUM((i.unit_price - i.buying_price) * i.quantity), 0)
            FROM shop.order_item i
            JOIN shop.customer_order o ON o.id = i.order_id
            WHERE o.status = $1
            ",
        )
        .bind(OrderStatus::Approved.as_str())
        .fetch_one(self.pool)
        .await?;

        stats.low_stock_variants = sqlx::query_scalar(
            "SELECT COUNT(*) FROM shop.product_variant WHERE quantity <= $1",
        )
        .bind(low_stock_threshold)
        .fetch_one(self.pool)
        .await?;

        Ok(stats)
    }
}
