//! Error types for the ClientPulse system.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Unauthorized")]
    Unauthenticated,

    #[error("No rows could be parsed from the uploaded file")]
    EmptyInput,

    #[error("Please add at least one metric")]
    NoValidMetrics,

    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// Returned for clients that do not exist *and* for clients owned by
    /// another tenant. The two cases must stay indistinguishable.
    #[error("Client not found or access denied")]
    NotFoundOrForbidden,

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Report store is unavailable")]
    StoreUnavailable,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ReportResult<T> = Result<T, ReportError>;

impl ReportError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Stable, machine-readable category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthenticated => ErrorKind::Unauthorized,
            Self::EmptyInput | Self::NoValidMetrics | Self::Validation { .. } => {
                ErrorKind::BadRequest
            }
            Self::NotFoundOrForbidden | Self::NotFound { .. } => ErrorKind::NotFound,
            Self::StoreUnavailable => ErrorKind::Unavailable,
            Self::Database(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Wire representation. Internal failures are reported with a generic
    /// message; the detail stays in the logs.
    pub fn to_response(&self) -> ErrorResponse {
        let kind = self.kind();
        let error = match kind {
            ErrorKind::Internal => "Failed to process report request".to_string(),
            _ => self.to_string(),
        };
        ErrorResponse { kind, error }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthorized,
    BadRequest,
    NotFound,
    Unavailable,
    Internal,
}

impl ErrorKind {
    /// HTTP status code conventionally paired with this kind.
    pub fn status(self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::Unavailable => 503,
            Self::Internal => 500,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub error: String,
}
