//! ClientPulse Ingest: turns uploaded delimited files and manually
//! entered metric pairs into a canonical [`MetricsDocument`].
//!
//! Everything in this crate is synchronous and free of I/O.
//!
//! [`MetricsDocument`]: clientpulse_core::models::metrics::MetricsDocument

pub mod config;
pub mod error;
pub mod normalize;
pub mod tabular;

pub use config::TabularConfig;
pub use error::IngestError;
pub use normalize::{MetricsInput, NormalizedMetrics, normalize, normalize_manual};
pub use tabular::{
    ParseError, ParseWarning, ParsedTable, TablePreview, check_upload, parse, preview_upload,
};
