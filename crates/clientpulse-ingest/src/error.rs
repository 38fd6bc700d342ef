//! Ingestion error types.

use clientpulse_core::error::ReportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("no rows could be parsed from the uploaded file")]
    EmptyInput,

    #[error("no metric has both a name and a value")]
    NoValidMetrics,

    #[error("unsupported file type: {file_name}")]
    UnsupportedFile { file_name: String },

    #[error("file is {size} bytes, limit is {max}")]
    TooLarge { size: usize, max: usize },
}

impl From<IngestError> for ReportError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::EmptyInput => ReportError::EmptyInput,
            IngestError::NoValidMetrics => ReportError::NoValidMetrics,
            IngestError::UnsupportedFile { .. } => {
                ReportError::validation("file", "Please upload a CSV file")
            }
            IngestError::TooLarge { .. } => ReportError::validation("file", err.to_string()),
        }
    }
}
