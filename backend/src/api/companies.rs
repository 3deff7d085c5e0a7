//! Company API endpoints.

use axum::extract::{Path, State};

use super::{success, ApiResult, AppJson};
use crate::errors::AppError;
use crate::models::{Company, UpdateCompanyRequest};
use crate::tracking::COMPANY_NOT_FOUND;
use crate::AppState;

/// GET /api/companies - List all companies.
pub async fn list_companies(State(state): State<AppState>) -> ApiResult<Vec<Company>> {
    success(state.companies.list_companies().await?)
}

/// GET /api/companies/{id} - Get a single company.
pub async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Company> {
    match state.companies.get_company(&id).await? {
        Some(company) => success(company),
        None => Err(AppError::NotFound(COMPANY_NOT_FOUND.to_string())),
    }
}

/// PUT /api/companies/{id} - Rename or recolor a company.
pub async fn update_company(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(request): AppJson<UpdateCompanyRequest>,
) -> ApiResult<Company> {
    success(state.tracker.update_company(&id, &request).await?)
}
