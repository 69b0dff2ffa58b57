//! Turning [`TaxiError`] into HTTP responses.

use axum::response::{Html, IntoResponse, Response};
use http::StatusCode;
use taxi_core::TaxiError;
use taxi_forms::widgets::escape_html;

use crate::pagination::PaginationError;

/// A handler error, rendered with the status from
/// [`TaxiError::status_code`].
///
/// Client errors show their message. Server errors are logged and show a
/// generic page so internals never reach the browser.
#[derive(Debug)]
pub struct AppError(pub TaxiError);

/// Result type for handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<TaxiError> for AppError {
    fn from(err: TaxiError) -> Self {
        Self(err)
    }
}

impl From<PaginationError> for AppError {
    fn from(err: PaginationError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
            return (status, Html("<h1>Server Error (500)</h1>".to_string())).into_response();
        }
        tracing::debug!(error = %self.0, status = status.as_u16(), "Client error");
        let title = status.canonical_reason().unwrap_or("Error");
        let body = format!("<h1>{title}</h1><p>{}</p>", escape_html(&self.0.to_string()));
        (status, Html(body)).into_response()
    }
}
