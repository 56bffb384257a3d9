//! Mapping of core errors onto HTTP responses.

use api_shared::ErrorRes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lablink_core::LabError;

const INTERNAL: &str = "Internal server error";

/// A handler failure, rendered as `{ "error": ... }` with a matching status.
#[derive(Debug)]
pub struct ApiError(pub LabError);

impl From<LabError> for ApiError {
    fn from(err: LabError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match &self.0 {
            LabError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            LabError::Types(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            LabError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            LabError::Configuration(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            LabError::Upstream { status, message } => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                message.clone(),
            ),
            LabError::Transport(_) | LabError::Decode(_) => {
                (StatusCode::BAD_GATEWAY, "Failed to fetch places".into())
            }
            LabError::CatalogRead(_) | LabError::CatalogYaml { .. } | LabError::Storage(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.into())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "request failed: {}", self.0);
        } else {
            tracing::warn!(status = status.as_u16(), "request rejected: {}", self.0);
        }
        (status, Json(ErrorRes::new(message))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
