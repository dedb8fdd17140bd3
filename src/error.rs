use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::engine::time_window::TimeWindowError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    /// Import batch rejected. `ids` holds the offending records, `None` where the id itself
    /// could not be read.
    #[error("validation failed for {entity}: {ids:?}")]
    Validation {
        entity: &'static str,
        ids: Vec<Option<i64>>,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    MalformedTimeWindow(#[from] TimeWindowError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Assign and complete report a missing courier or order as a plain client error.
    pub fn not_found_as_bad_request(self) -> Self {
        match self {
            AppError::NotFound(msg) => AppError::BadRequest(msg),
            other => other,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation { entity, ids } => {
                let offenders: Vec<_> = ids.iter().map(|id| json!({ "id": id })).collect();
                let mut detail = serde_json::Map::new();
                detail.insert(entity.to_string(), offenders.into());
                (
                    StatusCode::BAD_REQUEST,
                    json!({ "validation_error": detail }),
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::MalformedTimeWindow(err) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": err.to_string() }),
            ),
            AppError::Store(err) => {
                tracing::error!(error = %err, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "storage failure" }),
                )
            }
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": msg }),
            ),
        };

        (status, Json(body)).into_response()
    }
}
