use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use kgx::errors::KgError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// An error answered to the client as `{"error": ...}` with a matching status
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<KgError> for ApiError {
    fn from(err: KgError) -> Self {
        let status = match &err {
            KgError::Configuration(_) => StatusCode::BAD_REQUEST,
            KgError::Upstream(_) | KgError::Fetch(_) => StatusCode::BAD_GATEWAY,
            KgError::MalformedOutput { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("request failed: {}", err);
        }
        Self::new(status, err.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        error!("blocking task failed: {}", err);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal task failed")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}
