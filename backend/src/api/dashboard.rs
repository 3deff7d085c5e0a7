//! Dashboard API endpoint.

use axum::extract::State;

use super::{success, ApiResult};
use crate::models::DashboardStats;
use crate::AppState;

/// GET /api/dashboard/stats - Aggregate totals.
pub async fn dashboard_stats(State(state): State<AppState>) -> ApiResult<DashboardStats> {
    success(state.dashboard.stats().await?)
}
