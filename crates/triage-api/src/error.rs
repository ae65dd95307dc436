use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use triage_store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing or invalid credential")]
    Unauthorized,

    #[error("Thread not owned by caller: {0}")]
    Forbidden(String),

    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Service is administratively disabled")]
    ServiceDisabled,

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            ApiError::ThreadNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::ServiceDisabled => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            ApiError::Store(ref e) => match e {
                StoreError::ThreadNotFound(id) => {
                    (StatusCode::NOT_FOUND, format!("Thread not found: {id}"))
                }
                StoreError::NotOwner(id) => (
                    StatusCode::FORBIDDEN,
                    format!("Thread not owned by caller: {id}"),
                ),
                _ => {
                    tracing::error!("Storage error: {}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
                }
            },
            ApiError::Internal(ref e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
