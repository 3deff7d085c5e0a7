//! Program API endpoints: the nested documents inside a member.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use super::{message, success, ApiResult, AppJson, MessageResponse};
use crate::models::{AddProgramRequest, ProgramRef, ProgramUpdate};
use crate::AppState;

/// Body of a standard-field update response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProgramUpdateResponse {
    pub message: String,
    pub changes: Vec<String>,
}

/// PUT /api/members/{id}/programs/{company_id} - Partial update of standard fields.
pub async fn update_program(
    State(state): State<AppState>,
    Path((member_id, company_id)): Path<(String, String)>,
    AppJson(update): AppJson<ProgramUpdate>,
) -> ApiResult<ProgramUpdateResponse> {
    let outcome = state
        .tracker
        .apply_program_update(&member_id, &company_id, &update)
        .await?;

    let message = if outcome.changes.is_empty() {
        "Nenhuma alteração detectada"
    } else {
        "Programa atualizado com sucesso"
    };
    success(ProgramUpdateResponse {
        message: message.to_string(),
        changes: outcome.changes,
    })
}

/// PUT /api/members/{id}/programs/{company_id}/fields - Replace custom fields.
pub async fn update_custom_fields(
    State(state): State<AppState>,
    Path((member_id, company_id)): Path<(String, String)>,
    AppJson(fields): AppJson<BTreeMap<String, Option<String>>>,
) -> ApiResult<MessageResponse> {
    state
        .tracker
        .apply_custom_fields(&member_id, &company_id, fields)
        .await?;
    message("Campos personalizados atualizados com sucesso")
}

/// DELETE /api/members/{id}/programs/{company_id}/fields/{field} - Remove one custom field.
pub async fn delete_custom_field(
    State(state): State<AppState>,
    Path((member_id, company_id, field)): Path<(String, String, String)>,
) -> ApiResult<MessageResponse> {
    state
        .tracker
        .delete_custom_field(&member_id, &company_id, &field)
        .await?;
    message("Campo removido com sucesso")
}

/// POST /api/members/{id}/companies - Add a program, creating the company if needed.
pub async fn add_program(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
    AppJson(request): AppJson<AddProgramRequest>,
) -> ApiResult<ProgramRef> {
    success(
        state
            .tracker
            .add_program(&member_id, &request.company_name, request.color.as_deref())
            .await?,
    )
}

/// DELETE /api/members/{id}/programs/{company_id} - Remove a program from a member.
pub async fn delete_program(
    State(state): State<AppState>,
    Path((member_id, company_id)): Path<(String, String)>,
) -> ApiResult<MessageResponse> {
    state.tracker.delete_program(&member_id, &company_id).await?;
    message("Programa removido com sucesso")
}
