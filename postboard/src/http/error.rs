use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::{error, warn};

use crate::store::StoreError;

use super::responses::ErrorResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid uuid {0:?}")]
    InvalidUuid(String),
    #[error("{message}")]
    InvalidBody { status: StatusCode, message: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidUuid(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidBody { status, .. } => *status,
            ApiError::Store(StoreError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Store(
                StoreError::Constraint(_) | StoreError::Connectivity(_) | StoreError::Query(_),
            ) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidUuid(_) => "invalid_uuid",
            ApiError::InvalidBody { .. } => "invalid_body",
            ApiError::Store(StoreError::Validation(_)) => "validation_failed",
            ApiError::Store(StoreError::NotFound(_)) => "not_found",
            ApiError::Store(StoreError::Constraint(_)) => "constraint_violation",
            ApiError::Store(StoreError::Connectivity(_)) => "store_unavailable",
            ApiError::Store(StoreError::Query(_)) => "store_error",
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = self.code(), error = %self, "request failed");
        } else {
            warn!(code = self.code(), error = %self, "request rejected");
        }

        let details = match &self {
            ApiError::Store(StoreError::Validation(errors)) => Some(errors.clone()),
            _ => None,
        };
        let body = ErrorResponse {
            error: self.code(),
            message: self.to_string(),
            details,
        };
        (status, Json(body)).into_response()
    }
}
