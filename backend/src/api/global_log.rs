//! Change-log API endpoints.

use axum::extract::{Path, State};

use super::{success, ApiResult, AppQuery, LimitQuery};
use crate::errors::AppError;
use crate::models::ChangeLogEntry;
use crate::tracking::MEMBER_NOT_FOUND;
use crate::AppState;

/// GET /api/global-log?limit=N - Most recent entries first.
pub async fn global_log(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<LimitQuery>,
) -> ApiResult<Vec<ChangeLogEntry>> {
    let limit = query.resolve(state.config.global_log_limit);
    success(state.log.recent(limit).await?)
}

/// GET /api/members/{id}/log?limit=N - One member's history.
///
/// Only resolves for live members; entries of deleted members stay visible
/// in the global log.
pub async fn member_log(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppQuery(query): AppQuery<LimitQuery>,
) -> ApiResult<Vec<ChangeLogEntry>> {
    if state.members.get_member(&id).await?.is_none() {
        return Err(AppError::NotFound(MEMBER_NOT_FOUND.to_string()));
    }
    let limit = query.resolve(state.config.global_log_limit);
    success(state.log.for_member(&id, limit).await?)
}
