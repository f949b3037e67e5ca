// src/error.rs

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::fmt;

use crate::{models::RecordError, sheets::StoreError, views};

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error (e.g., a sheet lost a required column)
    InternalServerError(String),

    // 503 Service Unavailable (spreadsheet backend unreachable)
    ServiceUnavailable(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Message safe to show to a student.
    pub fn public_message(&self) -> &'static str {
        match self {
            AppError::InternalServerError(_) => "Internal Server Error",
            AppError::ServiceUnavailable(_) => {
                "The exam service is temporarily unavailable. Please try again."
            }
        }
    }
}

/// Implements `IntoResponse` for `AppError`.
/// Renders the error page with the matching HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::InternalServerError(msg) => tracing::error!("Internal Server Error: {}", msg),
            AppError::ServiceUnavailable(msg) => tracing::error!("Store unavailable: {}", msg),
        }
        let page = views::error_page(self.public_message());

        (self.status(), Html(page.into_string())).into_response()
    }
}

/// Converts `StoreError` into `AppError::ServiceUnavailable`.
/// Allows using `?` operator on spreadsheet calls.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::ServiceUnavailable(err.to_string())
    }
}

impl From<RecordError> for AppError {
    fn from(err: RecordError) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::Table;

    #[test]
    fn test_store_errors_are_unavailable() {
        let err = AppError::from(StoreError::Network("connection reset".to_string()));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!err.public_message().contains("connection reset"));
    }

    #[test]
    fn test_record_errors_are_internal() {
        let err = AppError::from(RecordError::MissingColumn {
            table: Table::Questions,
            column: "Answer",
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
