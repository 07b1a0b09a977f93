use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::store::StoreError;

/// Every failure a handler can surface. Internal detail is logged here and
/// never reaches the client — only the classified kind and its message
/// template do.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("resource not found")]
    NotFound,

    /// Title collision on insert. Wire-compatible with the original service,
    /// which reports this as 405 rather than 409.
    #[error("method not allowed")]
    Conflict,

    #[error("bad request")]
    MalformedRequest(String),

    #[error("unauthorized")]
    Unauthorized(AuthError),

    #[error("forbidden")]
    Forbidden(AuthError),

    #[error("unprocessable")]
    Unprocessable,

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InsufficientScope { .. } => ApiError::Forbidden(e),
            // A key-fetch outage is our problem, not the caller's
            // credentials.
            AuthError::KeysUnavailable(_) => ApiError::Internal(anyhow::anyhow!(e)),
            _ => ApiError::Unauthorized(e),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ApiError::NotFound,
            StoreError::TitleExists(_) => ApiError::Conflict,
            StoreError::Database(e) => ApiError::Internal(e.into()),
            StoreError::Corrupt(e) => ApiError::Internal(anyhow::anyhow!(e)),
        }
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Unprocessable => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            ApiError::NotFound => "resource not found".to_string(),
            ApiError::Conflict => "method not allowed".to_string(),
            ApiError::MalformedRequest(msg) => msg.clone(),
            ApiError::Unauthorized(e) => {
                tracing::warn!(error = %e, "request rejected: unauthorized");
                "unauthorized".to_string()
            }
            ApiError::Forbidden(e) => {
                tracing::warn!(error = %e, "request rejected: forbidden");
                e.to_string()
            }
            ApiError::Unprocessable => "unprocessable".to_string(),
            ApiError::Internal(e) => {
                tracing::error!("internal error: {:#}", e);
                "internal server error".to_string()
            }
        };

        let body = Json(json!({
            "success": false,
            "message": message,
            "error": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
