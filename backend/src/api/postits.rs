//! Post-it API endpoints: plain CRUD over free-text notes.

use axum::extract::{Path, State};

use super::{message, success, ApiResult, AppJson, MessageResponse};
use crate::clock;
use crate::errors::AppError;
use crate::models::{PostIt, PostItRequest};
use crate::AppState;

const POSTIT_NOT_FOUND: &str = "Post-it não encontrado";

/// GET /api/postits - List all post-its.
pub async fn list_postits(State(state): State<AppState>) -> ApiResult<Vec<PostIt>> {
    success(state.postits.list_postits().await?)
}

/// POST /api/postits - Create a post-it.
pub async fn create_postit(
    State(state): State<AppState>,
    AppJson(request): AppJson<PostItRequest>,
) -> ApiResult<PostIt> {
    let now = clock::now();
    let postit = PostIt {
        id: uuid::Uuid::new_v4().to_string(),
        content: request.content,
        created_at: now,
        updated_at: now,
    };
    state.postits.insert_postit(&postit).await?;
    tracing::debug!(postit_id = %postit.id, "Post-it created");
    success(postit)
}

/// PUT /api/postits/{id} - Replace a post-it's content.
pub async fn update_postit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(request): AppJson<PostItRequest>,
) -> ApiResult<PostIt> {
    let existing = state
        .postits
        .get_postit(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(POSTIT_NOT_FOUND.to_string()))?;

    match state
        .postits
        .update_postit(&id, &request.content, clock::after(existing.updated_at))
        .await?
    {
        Some(postit) => success(postit),
        None => Err(AppError::NotFound(POSTIT_NOT_FOUND.to_string())),
    }
}

/// DELETE /api/postits/{id} - Delete a post-it.
pub async fn delete_postit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<MessageResponse> {
    if !state.postits.delete_postit(&id).await? {
        return Err(AppError::NotFound(POSTIT_NOT_FOUND.to_string()));
    }
    message("Post-it removido com sucesso")
}
