//! Report service: ingestion, creation and disclosure of reports.

use clientpulse_core::error::{ReportError, ReportResult};
use clientpulse_core::models::metrics::{MetricEntry, MetricsDocument};
use clientpulse_core::models::report::{
    CreateReport, CreateReportRequest, Report, ReportWithClient, non_blank,
};
use clientpulse_core::models::tenant::{TenantIdentity, require_tenant};
use clientpulse_core::repository::{ClientRepository, ReportRepository};
use clientpulse_ingest::{
    MetricsInput, ParseError, ParseWarning, TablePreview, check_upload, normalize,
    normalize_manual, parse, preview_upload,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::deadline::with_deadline;
use crate::guard::TenantGuard;

/// Metrics as they arrive from the caller, before normalization.
#[derive(Debug, Clone)]
pub enum RawMetrics {
    /// An uploaded delimited file.
    Upload { file_name: String, bytes: Vec<u8> },
    /// Manually entered `(metric, value)` pairs.
    Manual(Vec<MetricEntry>),
}

/// Input for the ingestion flow.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub client_id: String,
    pub period: String,
    pub metrics: RawMetrics,
    pub ai_summary: Option<String>,
    pub pdf_url: Option<String>,
}

/// Successful ingestion result.
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub report: Report,
    /// Rows of the upload that were skipped.
    pub parse_errors: Vec<ParseError>,
    pub warnings: Vec<ParseWarning>,
}

/// Report service.
///
/// Generic over repository implementations so that the pipeline has no
/// dependency on the database crate.
pub struct ReportService<C: ClientRepository, R: ReportRepository> {
    guard: TenantGuard<C>,
    reports: R,
    config: ServiceConfig,
}

impl<C: ClientRepository, R: ReportRepository> ReportService<C, R> {
    pub fn new(clients: C, reports: R, config: ServiceConfig) -> Self {
        Self {
            guard: TenantGuard::new(clients, config.store_timeout),
            reports,
            config,
        }
    }

    pub fn guard(&self) -> &TenantGuard<C> {
        &self.guard
    }

    /// Parse, normalize, authorize and persist raw metrics as a new
    /// report.
    pub async fn ingest(
        &self,
        caller: Option<&TenantIdentity>,
        request: IngestRequest,
    ) -> ReportResult<IngestOutcome> {
        // 1. Identity and required fields.
        let tenant = require_tenant(caller)?;
        let client_ref = required(Some(request.client_id), "client_id", "Client ID is required")?;
        let period = required(Some(request.period), "period", "Period is required")?;

        // 2. Parse and normalize.
        let input = match request.metrics {
            RawMetrics::Upload { file_name, bytes } => {
                check_upload(&file_name, bytes.len(), &self.config.tabular)?;
                MetricsInput::Tabular(parse(&bytes, &self.config.tabular))
            }
            RawMetrics::Manual(entries) => MetricsInput::Manual(entries),
        };
        let normalized = normalize(&input)?;
        if !normalized.parse_errors.is_empty() {
            warn!(
                skipped_rows = normalized.parse_errors.len(),
                "Upload contained malformed rows"
            );
        }

        // 3. Authorize, then 4. persist.
        let client = self.guard.authorize(tenant, &client_ref).await?;
        let report = self
            .persist(CreateReport {
                client_id: client.id,
                period,
                metrics: normalized.document,
                ai_summary: non_blank(request.ai_summary),
                pdf_url: non_blank(request.pdf_url),
            })
            .await?;

        Ok(IngestOutcome {
            report,
            parse_errors: normalized.parse_errors,
            warnings: normalized.warnings,
        })
    }

    /// Create a report from an already-assembled wire request.
    ///
    /// Manual entries are re-normalized so that incomplete pairs never
    /// reach the store. Tabular rows are stored as given, but a row with
    /// no columns at all is rejected.
    pub async fn create(
        &self,
        caller: Option<&TenantIdentity>,
        request: CreateReportRequest,
    ) -> ReportResult<Report> {
        let tenant = require_tenant(caller)?;
        let client_ref = required(request.client_id, "client_id", "Client ID is required")?;
        let period = required(request.period, "period", "Period is required")?;
        let metrics = request
            .metrics_json
            .filter(|m| !m.is_empty())
            .ok_or_else(|| ReportError::validation("metrics_json", "Metrics data is required"))?;
        let metrics = match metrics {
            MetricsDocument::Manual(entries) => normalize_manual(&entries)?,
            tabular @ MetricsDocument::Tabular(_) => tabular,
        };
        if let Some(row) = metrics.first_empty_row() {
            return Err(ReportError::validation(
                "metrics_json",
                format!("Metrics row {row} has no columns"),
            ));
        }

        let client = self.guard.authorize(tenant, &client_ref).await?;
        self.persist(CreateReport {
            client_id: client.id,
            period,
            metrics,
            ai_summary: non_blank(request.ai_summary),
            pdf_url: non_blank(request.pdf_url),
        })
        .await
    }

    /// All reports of the caller's clients, newest first.
    pub async fn list(&self, caller: Option<&TenantIdentity>) -> ReportResult<Vec<ReportWithClient>> {
        let tenant = require_tenant(caller)?;
        with_deadline(
            self.config.store_timeout,
            "list_reports",
            self.reports.list_by_owner(tenant.user_id()),
        )
        .await
    }

    /// Disclose a single report. Reports of other tenants' clients are
    /// indistinguishable from reports that do not exist.
    pub async fn get(&self, caller: Option<&TenantIdentity>, report_ref: &str) -> ReportResult<Report> {
        let tenant = require_tenant(caller)?;
        let report_id =
            Uuid::parse_str(report_ref.trim()).map_err(|_| ReportError::NotFoundOrForbidden)?;

        let report = with_deadline(
            self.config.store_timeout,
            "get_report",
            self.reports.get_by_id(report_id),
        )
        .await
        .map_err(|e| match e {
            ReportError::NotFound { .. } => ReportError::NotFoundOrForbidden,
            other => other,
        })?;

        self.guard.authorize_id(tenant, report.client_id).await?;
        Ok(report)
    }

    /// Parse an upload and return its first rows without persisting
    /// anything.
    pub fn preview(
        &self,
        caller: Option<&TenantIdentity>,
        file_name: &str,
        bytes: &[u8],
    ) -> ReportResult<TablePreview> {
        require_tenant(caller)?;
        preview_upload(file_name, bytes, &self.config.tabular).map_err(Into::into)
    }

    async fn persist(&self, input: CreateReport) -> ReportResult<Report> {
        let client_id = input.client_id;
        let report = with_deadline(
            self.config.store_timeout,
            "create_report",
            self.reports.create(input),
        )
        .await
        .map_err(|e| match e {
            // The client vanished between authorization and insert.
            ReportError::NotFound { .. } => ReportError::NotFoundOrForbidden,
            other => other,
        })?;

        info!(report_id = %report.id, client_id = %client_id, "Report snapshot stored");
        Ok(report)
    }
}

fn required(value: Option<String>, field: &'static str, message: &str) -> ReportResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ReportError::validation(field, message))
}
