//! Ingestion configuration.

/// Configuration for delimited-file uploads.
#[derive(Debug, Clone)]
pub struct TabularConfig {
    /// Field delimiter (default: `,`).
    pub delimiter: u8,
    /// Largest accepted upload in bytes (default: 5 MiB).
    pub max_bytes: usize,
    /// Rows shown by [`ParsedTable::preview`](crate::ParsedTable::preview)
    /// when no explicit limit is given (default: 5).
    pub preview_rows: usize,
}

impl Default for TabularConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            max_bytes: 5 * 1024 * 1024,
            preview_rows: 5,
        }
    }
}
