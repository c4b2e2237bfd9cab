//! Error types for command-center
//!
//! HTTP status mapping:
//! - 400: Validation (missing or mistyped request fields)
//! - 200 with `ok: false`: NotAvailable (no external log file)
//! - 500: everything else (storage, locking, configuration)

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

/// Main error type for command-center operations
#[derive(Error, Debug)]
pub enum Error {
    // Caller errors (400)
    #[error("{0}")]
    Validation(String),

    // Soft failures (200, ok: false)
    #[error("{0}")]
    NotAvailable(String),

    // Server failures (500)
    #[error("Corrupt document {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,

            Error::NotAvailable(_) => StatusCode::OK,

            Error::Corrupt { .. }
            | Error::InvalidConfig(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::LockFailed(_)
            | Error::OperationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Result type alias for command-center operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wire shape of an error response: `{ ok: false, error }`
#[derive(serde::Serialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub error: String,
}

impl From<&Error> for ErrorBody {
    fn from(err: &Error) -> Self {
        ErrorBody {
            ok: false,
            error: err.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(ErrorBody::from(&self))).into_response()
    }
}
