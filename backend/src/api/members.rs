//! Member API endpoints.

use axum::extract::{Path, State};

use super::{success, ApiResult, AppJson};
use crate::errors::AppError;
use crate::models::{CreateMemberRequest, Member, MemberRef};
use crate::tracking::MEMBER_NOT_FOUND;
use crate::AppState;

/// GET /api/members - List all members.
pub async fn list_members(State(state): State<AppState>) -> ApiResult<Vec<Member>> {
    success(state.members.list_members().await?)
}

/// GET /api/members/{id} - Get a single member.
pub async fn get_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Member> {
    match state.members.get_member(&id).await {
        Ok(Some(member)) => success(member),
        Ok(None) => Err(AppError::NotFound(MEMBER_NOT_FOUND.to_string())),
        Err(e) => Err(e),
    }
}

/// POST /api/members - Create a new member.
pub async fn create_member(
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateMemberRequest>,
) -> ApiResult<MemberRef> {
    success(state.tracker.create_member(&request.name).await?)
}

/// DELETE /api/members/{id} - Delete a member.
pub async fn delete_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<MemberRef> {
    success(state.tracker.delete_member(&id).await?)
}
