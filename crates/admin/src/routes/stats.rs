//! Dashboard summary.

use axum::{Json, extract::State};
use tracing::instrument;

use souk_db::{DashboardStats, StatsRepository};

use crate::error::Result;
use crate::state::AppState;

/// Order counts, approved revenue, gross profit and low-stock count.
#[instrument(skip(state))]
pub async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardStats>> {
    let stats = StatsRepository::new(state.pool())
        .dashboard(state.config().low_stock_threshold)
        .await?;
    Ok(Json(stats))
}
