//! REST API module.
//!
//! Contains all API routes and handlers following the frontend contract.
//! Successful responses are the bare JSON payload; errors render through
//! [`AppError`](crate::errors::AppError) as `{"detail": ...}`.

mod companies;
mod dashboard;
mod global_log;
mod members;
mod postits;
mod programs;

pub use companies::*;
pub use dashboard::*;
pub use global_log::*;
pub use members::*;
pub use postits::*;
pub use programs::*;

use axum::{
    extract::{FromRequest, FromRequestParts},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Response type for every handler.
pub type ApiResult<T> = Result<Json<T>, AppError>;

/// JSON body extractor whose rejections render as [`AppError::BadRequest`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Query-string extractor whose rejections render as [`AppError::BadRequest`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

/// `{"message": ...}` acknowledgement body.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(data))
}

/// Create a `{"message": ...}` response.
pub fn message(text: impl Into<String>) -> ApiResult<MessageResponse> {
    success(MessageResponse {
        message: text.into(),
    })
}

/// `?limit=N` query parameter.
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Upper bound for any requested page size.
pub const MAX_LOG_LIMIT: u32 = 1000;

impl LimitQuery {
    /// Requested limit, or `default`, clamped to `1..=MAX_LOG_LIMIT`.
    pub fn resolve(&self, default: u32) -> u32 {
        self.limit.unwrap_or(default).clamp(1, MAX_LOG_LIMIT)
    }
}
