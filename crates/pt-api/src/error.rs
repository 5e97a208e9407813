//! Maps the `AppError` taxonomy onto HTTP responses. Client-correctable
//! failures land in the 4xx class, infrastructure failures in the 5xx class;
//! every kind keeps its identity in the JSON body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pt_core::AppError;
use serde::Serialize;

pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

fn kind(err: &AppError) -> &'static str {
    match err {
        AppError::Validation(_) => "validation",
        AppError::Materialization(_) => "materialization",
        AppError::DataFormat(_) => "data_format",
        AppError::Persistence(_) => "persistence",
        AppError::Detection(_) => "detection",
        AppError::NotFound(_) => "not_found",
        AppError::InvalidIdentifier(_) => "invalid_identifier",
        AppError::Internal(_) => "internal",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AppError::Validation(_) | AppError::InvalidIdentifier(_) | AppError::DataFormat(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = ErrorBody {
            error: kind(&self.0),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
