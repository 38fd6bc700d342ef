//! Timeout wrapper for store calls.

use std::time::Duration;

use clientpulse_core::error::{ReportError, ReportResult};
use tracing::warn;

/// Await `fut`, giving up after `limit`. The inner future is dropped on
/// timeout, which cancels the pending database call.
pub(crate) async fn with_deadline<T, F>(
    limit: Duration,
    operation: &'static str,
    fut: F,
) -> ReportResult<T>
where
    F: Future<Output = ReportResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                operation,
                timeout_ms = limit.as_millis() as u64,
                "Store call timed out"
            );
            Err(ReportError::StoreUnavailable)
        }
    }
}
