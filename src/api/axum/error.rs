use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::SessionError;
use crate::api::{ErrorResponse, log_failure, status_code};

/// converts `SessionError` into appropriate HTTP responses
#[derive(Debug)]
pub struct AppError(pub SessionError);

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        log_failure(&self.0);

        let status = StatusCode::from_u16(status_code(&self.0))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse::from(self.0))).into_response()
    }
}
