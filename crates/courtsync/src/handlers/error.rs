use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use courtsync_core::availability::AvailabilityError;
use courtsync_core::cache::CacheError;
use courtsync_core::http_mapping::{
    availability_error_to_status_code, cache_error_to_status_code,
    invalidation_error_to_status_code,
};
use courtsync_core::invalidation::InvalidationError;

/// Errors detected at the HTTP boundary, before the core is reached.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Invalid notification: {0}")]
    InvalidNotification(String),
}

pub struct AppError(pub anyhow::Error);

impl AppError {
    fn status_code(&self) -> StatusCode {
        let code = if let Some(err) = self.0.downcast_ref::<AvailabilityError>() {
            availability_error_to_status_code(err)
        } else if let Some(err) = self.0.downcast_ref::<InvalidationError>() {
            invalidation_error_to_status_code(err)
        } else if let Some(err) = self.0.downcast_ref::<CacheError>() {
            cache_error_to_status_code(err)
        } else if self.0.downcast_ref::<RequestError>().is_some() {
            400
        } else {
            500
        };
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        if status_code.is_server_error() {
            tracing::error!(status = %status_code, error = %self.0, "Request failed");
        }
        (status_code, self.0.to_string()).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
