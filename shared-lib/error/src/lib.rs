//! Common error types for the timesheet services.
//!
//! The computation core never fails; these types cover the edges around it:
//! the external schedule store, report export, and request validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Schedule store error: {0}")]
    Store(#[from] StoreError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Errors raised by the external schedule store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed schedule document: {0}")]
    Malformed(String),
}

/// Errors raised while writing a report export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV serialization failed: {0}")]
    Csv(String),

    #[error("I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response for API clients.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Add details to the error response.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl From<&StoreError> for ErrorResponse {
    fn from(err: &StoreError) -> Self {
        let code = match err {
            StoreError::Unavailable(_) => "STORE_UNAVAILABLE",
            StoreError::Malformed(_) => "STORE_MALFORMED",
        };
        Self::new(code, "Schedule store request failed").with_details(err.to_string())
    }
}

impl From<&ExportError> for ErrorResponse {
    fn from(err: &ExportError) -> Self {
        let code = match err {
            ExportError::Csv(_) => "EXPORT_CSV_FAILED",
            ExportError::Io(_) => "EXPORT_IO_FAILED",
        };
        Self::new(code, "Report export failed").with_details(err.to_string())
    }
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        match err {
            AppError::Store(e) => e.into(),
            AppError::Export(e) => e.into(),
            AppError::Validation(msg) => Self::new("VALIDATION_FAILED", msg.clone()),
        }
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_response_code() {
        let err = AppError::from(StoreError::Unavailable("timeout".to_string()));
        let response = ErrorResponse::from(&err);
        assert_eq!(response.code, "STORE_UNAVAILABLE");
        assert!(response.details.unwrap().contains("timeout"));
    }

    #[test]
    fn test_export_error_response_code() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such directory");
        let err = AppError::from(ExportError::from(io));
        let response = ErrorResponse::from(&err);
        assert_eq!(response.code, "EXPORT_IO_FAILED");
        assert_eq!(response.message, "Report export failed");
    }

    #[test]
    fn test_details_skipped_when_absent() {
        let response = ErrorResponse::from(&AppError::Validation("empty period".to_string()));
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(
            json,
            r#"{"code":"VALIDATION_FAILED","message":"empty period"}"#
        );
    }
}
