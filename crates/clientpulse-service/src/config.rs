//! Service configuration.

use std::time::Duration;

use clientpulse_ingest::TabularConfig;

/// Configuration for the report service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Upper bound for each guard lookup and store call
    /// (default: 10 seconds). Exceeding it yields `StoreUnavailable`.
    pub store_timeout: Duration,
    /// Delimited-upload settings.
    pub tabular: TabularConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(10),
            tabular: TabularConfig::default(),
        }
    }
}
