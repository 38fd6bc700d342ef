//! Conversion of raw input into a [`MetricsDocument`].

use clientpulse_core::models::metrics::{MetricEntry, MetricsDocument};

use crate::error::IngestError;
use crate::tabular::{ParseError, ParseWarning, ParsedTable};

/// Raw metrics as submitted by the caller.
#[derive(Debug, Clone)]
pub enum MetricsInput {
    Tabular(ParsedTable),
    Manual(Vec<MetricEntry>),
}

/// A normalized document plus whatever the parser had to report about it.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedMetrics {
    pub document: MetricsDocument,
    pub parse_errors: Vec<ParseError>,
    pub warnings: Vec<ParseWarning>,
}

pub fn normalize(input: &MetricsInput) -> Result<NormalizedMetrics, IngestError> {
    match input {
        MetricsInput::Tabular(table) => normalize_tabular(table),
        MetricsInput::Manual(entries) => Ok(NormalizedMetrics {
            document: normalize_manual(entries)?,
            parse_errors: Vec::new(),
            warnings: Vec::new(),
        }),
    }
}

/// Keep entries whose name and value are both non-blank, in input order.
pub fn normalize_manual(entries: &[MetricEntry]) -> Result<MetricsDocument, IngestError> {
    let kept: Vec<MetricEntry> = entries
        .iter()
        .filter(|entry| entry.is_complete())
        .cloned()
        .collect();

    if kept.is_empty() {
        return Err(IngestError::NoValidMetrics);
    }
    Ok(MetricsDocument::Manual(kept))
}

/// Rows pass through untouched; no column types are inferred.
pub fn normalize_tabular(table: &ParsedTable) -> Result<NormalizedMetrics, IngestError> {
    if table.rows.is_empty() {
        return Err(IngestError::EmptyInput);
    }
    Ok(NormalizedMetrics {
        document: MetricsDocument::Tabular(table.rows.clone()),
        parse_errors: table.errors.clone(),
        warnings: table.warnings.clone(),
    })
}
