use crate::models::UnknownName;
use axum::{extract::rejection::JsonRejection, http::StatusCode};
use tracing::error;

/// Failures of the entry store read/write path.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("data file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("data file encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("entry store unavailable: {0}")]
    Unavailable(String),

    /// A write was rejected because the resulting record is invalid.
    #[error(transparent)]
    Invalid(#[from] EntryError),
}

/// Errors surfaced by the aggregation core.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    /// Malformed period kind, offset or range. Raised before any read.
    #[error("invalid period: {0}")]
    InvalidPeriod(String),

    /// The entry store read failed. Aggregations are read-only, so the
    /// whole call may be retried.
    #[error("data unavailable: {0}")]
    DataUnavailable(#[from] StoreError),
}

impl AnalyticsError {
    pub fn invalid_period(message: impl Into<String>) -> Self {
        Self::InvalidPeriod(message.into())
    }
}

/// Write-time validation failure for a logged entry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EntryError {
    #[error("{field} must not be negative")]
    Negative { field: &'static str },

    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
    },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("end_date must not be before start_date")]
    EndsBeforeStart,
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<AnalyticsError> for AppError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::InvalidPeriod(_) => Self::bad_request(err.to_string()),
            AnalyticsError::DataUnavailable(ref source) => {
                error!(error = %source, "entry store read failed");
                Self {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    message: err.to_string(),
                }
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Invalid(invalid) => Self::bad_request(invalid.to_string()),
            err => {
                error!(error = %err, "entry store request failed");
                Self::internal(err)
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<EntryError> for AppError {
    fn from(err: EntryError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<UnknownName> for AppError {
    fn from(err: UnknownName) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
