//! Report domain model.
//!
//! A report is an immutable snapshot of a client's metrics for one
//! period. Corrections produce a new report; nothing is updated in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ReportError, ReportResult};
use crate::models::metrics::MetricsDocument;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub client_id: Uuid,
    /// Free-text reporting interval, e.g. `Q4 2024`.
    pub period: String,
    pub metrics_json: MetricsDocument,
    pub ai_summary: Option<String>,
    /// Location of the rendered artifact, if one exists.
    pub pdf_url: Option<String>,
    /// Assigned by the store.
    pub created_at: DateTime<Utc>,
}

/// A report joined with its client's display fields.
#[derive(Debug, Clone, Serialize)]
pub struct ReportWithClient {
    #[serde(flatten)]
    pub report: Report,
    pub client_name: String,
    pub client_logo: Option<String>,
    pub client_brand_color: Option<String>,
}

/// Fields required to persist a new report. The client must already have
/// been authorized for the caller.
#[derive(Debug, Clone)]
pub struct CreateReport {
    pub client_id: Uuid,
    pub period: String,
    pub metrics: MetricsDocument,
    pub ai_summary: Option<String>,
    pub pdf_url: Option<String>,
}

impl CreateReport {
    /// Check required fields. Runs before any persistence attempt.
    pub fn validate(&self) -> ReportResult<()> {
        if self.period.trim().is_empty() {
            return Err(ReportError::validation("period", "Period is required"));
        }
        if self.metrics.is_empty() {
            return Err(ReportError::validation(
                "metrics_json",
                "Metrics data is required",
            ));
        }
        if let Some(row) = self.metrics.first_empty_row() {
            return Err(ReportError::validation(
                "metrics_json",
                format!("Metrics row {row} has no columns"),
            ));
        }
        Ok(())
    }
}

/// Create request as received on the wire. Every field is optional here
/// so that missing fields surface as field-specific validation errors
/// rather than as decode failures.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateReportRequest {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub metrics_json: Option<MetricsDocument>,
    #[serde(default)]
    pub ai_summary: Option<String>,
    #[serde(default)]
    pub pdf_url: Option<String>,
}

/// Empty optional strings are stored as null.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
