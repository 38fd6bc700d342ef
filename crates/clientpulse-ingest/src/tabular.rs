//! Delimited-text parsing with partial recovery.
//!
//! The first record is the header. Malformed data rows are collected as
//! [`ParseError`]s and skipped; every well-formed row is kept.

use std::collections::HashSet;

use clientpulse_core::models::metrics::MetricRow;
use csv::StringRecord;
use serde::Serialize;
use tracing::debug;

use crate::config::TabularConfig;
use crate::error::IngestError;

/// A data row that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseError {
    /// 1-based index among the non-empty data rows; `0` is the header.
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseWarning {
    /// A header name repeats an earlier one. Cells under the later column
    /// overwrite the earlier column's value in each row.
    DuplicateColumn { column: String, position: usize },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTable {
    /// Distinct column names in first-occurrence order.
    pub columns: Vec<String>,
    pub rows: Vec<MetricRow>,
    pub errors: Vec<ParseError>,
    pub warnings: Vec<ParseWarning>,
}

/// First rows of a parsed upload, for display before submission.
#[derive(Debug, Clone, Serialize)]
pub struct TablePreview {
    pub columns: Vec<String>,
    pub rows: Vec<MetricRow>,
    pub total_rows: usize,
    pub errors: Vec<ParseError>,
    pub warnings: Vec<ParseWarning>,
}

impl ParsedTable {
    pub fn preview(&self, limit: usize) -> TablePreview {
        TablePreview {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(limit).cloned().collect(),
            total_rows: self.rows.len(),
            errors: self.errors.clone(),
            warnings: self.warnings.clone(),
        }
    }
}

/// Gate, parse and preview an upload in one step. An upload without a
/// single usable row is rejected as [`IngestError::EmptyInput`].
pub fn preview_upload(
    file_name: &str,
    bytes: &[u8],
    config: &TabularConfig,
) -> Result<TablePreview, IngestError> {
    check_upload(file_name, bytes.len(), config)?;
    let table = parse(bytes, config);
    if table.rows.is_empty() {
        return Err(IngestError::EmptyInput);
    }
    Ok(table.preview(config.preview_rows))
}

/// Gate an upload by name and size before reading it.
pub fn check_upload(file_name: &str, size: usize, config: &TabularConfig) -> Result<(), IngestError> {
    if !file_name.to_ascii_lowercase().ends_with(".csv") {
        return Err(IngestError::UnsupportedFile {
            file_name: file_name.to_string(),
        });
    }
    if size > config.max_bytes {
        return Err(IngestError::TooLarge {
            size,
            max: config.max_bytes,
        });
    }
    Ok(())
}

/// Parse a delimited file with a header row.
pub fn parse(input: &[u8], config: &TabularConfig) -> ParsedTable {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let mut table = ParsedTable::default();

    let headers = match reader.headers() {
        Ok(headers) => headers.clone(),
        Err(e) => {
            table.errors.push(ParseError {
                row: 0,
                message: format!("Invalid header row: {e}"),
            });
            return table;
        }
    };

    let mut seen = HashSet::new();
    for (index, name) in headers.iter().enumerate() {
        if seen.insert(name) {
            table.columns.push(name.to_string());
        } else {
            table.warnings.push(ParseWarning::DuplicateColumn {
                column: name.to_string(),
                position: index + 1,
            });
        }
    }

    // The csv reader already skips empty lines, so the enumeration index
    // counts non-empty data rows only.
    for (index, result) in reader.records().enumerate() {
        let row = index + 1;
        match result {
            Ok(record) => match build_row(&headers, &record) {
                Ok(parsed) => table.rows.push(parsed),
                Err(message) => table.errors.push(ParseError { row, message }),
            },
            Err(e) => table.errors.push(ParseError {
                row,
                message: e.to_string(),
            }),
        }
    }

    debug!(
        columns = table.columns.len(),
        rows = table.rows.len(),
        errors = table.errors.len(),
        warnings = table.warnings.len(),
        "Parsed delimited upload"
    );

    table
}

fn build_row(headers: &StringRecord, record: &StringRecord) -> Result<MetricRow, String> {
    let expected = headers.len();
    let found = record.len();
    // A quote that is never closed swallows every following line into
    // its field, so the record ends in a multi-line field and comes up
    // short.
    if found != expected && record.iter().last().is_some_and(|f| f.contains(['\n', '\r'])) {
        return Err(format!(
            "Unterminated quoted field: the rest of the file was read as one value \
             (expected {expected} fields but parsed {found})"
        ));
    }
    if found < expected {
        return Err(format!(
            "Too few fields: expected {expected} fields but parsed {found}"
        ));
    }
    if found > expected {
        return Err(format!(
            "Too many fields: expected {expected} fields but parsed {found}"
        ));
    }
    Ok(headers.iter().zip(record.iter()).collect())
}
