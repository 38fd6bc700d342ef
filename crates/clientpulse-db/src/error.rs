//! Errors raised by the SurrealDB layer and their mapping onto
//! [`ReportError`].

use std::time::Duration;

use clientpulse_core::error::ReportError;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    /// The store did not answer within the configured bound.
    #[error("SurrealDB at {url} did not respond within {timeout:?}")]
    Unavailable { url: String, timeout: Duration },

    #[error("Migration failed: {0}")]
    Migration(String),

    /// A statement ran but a schema assertion rejected it.
    #[error("Query rejected: {0}")]
    Query(String),

    #[error("Stored record is malformed: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for ReportError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ReportError::NotFound { entity, id },
            DbError::Unavailable { .. } => ReportError::StoreUnavailable,
            other => ReportError::Database(other.to_string()),
        }
    }
}
