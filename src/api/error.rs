use crate::session::SessionError;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use nse_forecast::ForecastError;
use serde_json::json;

/// Shown whenever an upload cannot be turned into a table
pub const INVALID_DATASET_WARNING: &str =
    "Invalid or empty dataset. Please upload a valid dataset to proceed.";

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    /// The upload body could not be read, e.g. it exceeds the size limit
    Upload(StatusCode, String),
    /// The session has no table yet
    NoDataset,
    /// The upload was rejected; carries the loader's reason
    InvalidDataset(String),
    /// A view could not be computed from the loaded table
    View(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::Upload(status, msg) => (status, json!({ "error": msg })),
            ApiError::NoDataset => (
                StatusCode::CONFLICT,
                json!({ "error": SessionError::NoDataset.to_string() }),
            ),
            ApiError::InvalidDataset(detail) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": INVALID_DATASET_WARNING, "detail": detail }),
            ),
            ApiError::View(msg) => (StatusCode::UNPROCESSABLE_ENTITY, json!({ "error": msg })),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": msg })),
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<ForecastError> for ApiError {
    fn from(err: ForecastError) -> Self {
        if err.is_invalid_dataset() {
            return ApiError::InvalidDataset(err.to_string());
        }
        match err {
            ForecastError::InvalidParameter(msg) => ApiError::BadRequest(msg),
            other => ApiError::View(other.to_string()),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::UnknownSession(_) => ApiError::NotFound(err.to_string()),
            SessionError::NoDataset => ApiError::NoDataset,
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::Upload(err.status(), format!("multipart error: {}", err.body_text()))
    }
}
