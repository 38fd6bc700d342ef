//! SurrealDB implementation of [`ReportRepository`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use clientpulse_core::error::ReportResult;
use clientpulse_core::models::metrics::{MetricsDocument, MetricsSource};
use clientpulse_core::models::report::{CreateReport, Report, ReportWithClient};
use clientpulse_core::repository::ReportRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info};
use uuid::Uuid;

use super::client::ClientRowWithId;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ReportRow {
    client_id: String,
    period: String,
    metrics_source: String,
    metrics_json: String,
    ai_summary: Option<String>,
    pdf_url: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ReportRowWithId {
    record_id: String,
    client_id: String,
    period: String,
    metrics_source: String,
    metrics_json: String,
    ai_summary: Option<String>,
    pdf_url: Option<String>,
    created_at: DateTime<Utc>,
}

fn row_to_report(row: ReportRow, id: Uuid) -> Result<Report, DbError> {
    let client_id = Uuid::parse_str(&row.client_id)
        .map_err(|e| DbError::Decode(format!("invalid client UUID: {e}")))?;
    let source = MetricsSource::parse(&row.metrics_source)
        .ok_or_else(|| DbError::Decode(format!("unknown metrics source: {}", row.metrics_source)))?;
    let metrics_json = MetricsDocument::from_json(source, &row.metrics_json)
        .map_err(|e| DbError::Decode(format!("invalid metrics document: {e}")))?;
    Ok(Report {
        id,
        client_id,
        period: row.period,
        metrics_json,
        ai_summary: row.ai_summary,
        pdf_url: row.pdf_url,
        created_at: row.created_at,
    })
}

impl ReportRowWithId {
    fn try_into_report(self) -> Result<Report, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        row_to_report(
            ReportRow {
                client_id: self.client_id,
                period: self.period,
                metrics_source: self.metrics_source,
                metrics_json: self.metrics_json,
                ai_summary: self.ai_summary,
                pdf_url: self.pdf_url,
                created_at: self.created_at,
            },
            id,
        )
    }
}

/// SurrealDB implementation of the Report repository.
#[derive(Clone)]
pub struct SurrealReportRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealReportRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn client_exists(&self, client_id: &str) -> Result<bool, DbError> {
        let mut result = self
            .db
            .query("RETURN record::exists(type::record('client', $id))")
            .bind(("id", client_id.to_string()))
            .await?;
        let exists: Option<bool> = result.take(0)?;
        Ok(exists.unwrap_or(false))
    }
}

impl<C: Connection> ReportRepository for SurrealReportRepository<C> {
    async fn create(&self, input: CreateReport) -> ReportResult<Report> {
        input.validate()?;

        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let client_id_str = input.client_id.to_string();
        let source = input.metrics.source();
        let metrics_json = input
            .metrics
            .to_json()
            .map_err(|e| DbError::Decode(format!("cannot encode metrics: {e}")))?;

        // One CREATE statement: either the whole report lands or nothing
        // does. `created_at` is filled in by the schema default.
        let result = self
            .db
            .query(
                "CREATE type::record('report', $id) SET \
                 client_id = $client_id, period = $period, \
                 metrics_source = $metrics_source, \
                 metrics_json = $metrics_json, \
                 ai_summary = $ai_summary, pdf_url = $pdf_url",
            )
            .bind(("id", id_str.clone()))
            .bind(("client_id", client_id_str.clone()))
            .bind(("period", input.period))
            .bind(("metrics_source", source.as_str()))
            .bind(("metrics_json", metrics_json))
            .bind(("ai_summary", input.ai_summary))
            .bind(("pdf_url", input.pdf_url))
            .await
            .map_err(DbError::from)?;

        let mut result = match result.check() {
            Ok(result) => result,
            Err(e) => {
                // The schema rejects reports for clients that no longer
                // exist; report that as a missing client.
                if !self.client_exists(&client_id_str).await? {
                    return Err(DbError::NotFound {
                        entity: "client".into(),
                        id: client_id_str,
                    }
                    .into());
                }
                return Err(DbError::Query(e.to_string()).into());
            }
        };

        let rows: Vec<ReportRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "report".into(),
            id: id_str,
        })?;

        let report = row_to_report(row, id)?;
        info!(
            report_id = %report.id,
            client_id = %report.client_id,
            metrics_source = source.as_str(),
            metrics = report.metrics_json.len(),
            "Report created"
        );
        Ok(report)
    }

    async fn get_by_id(&self, id: Uuid) -> ReportResult<Report> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('report', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ReportRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "report".into(),
            id: id_str,
        })?;

        row_to_report(row, id).map_err(Into::into)
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> ReportResult<Vec<ReportWithClient>> {
        // Ownership is part of the report query itself: only reports whose
        // client_id is among the owner's clients are selected.
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM client \
                 WHERE user_id = $user_id; \
                 SELECT meta::id(id) AS record_id, * FROM report \
                 WHERE client_id IN \
                     (SELECT VALUE meta::id(id) FROM client WHERE user_id = $user_id) \
                 ORDER BY created_at DESC",
            )
            .bind(("user_id", owner_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let client_rows: Vec<ClientRowWithId> = result.take(0).map_err(DbError::from)?;
        let report_rows: Vec<ReportRowWithId> = result.take(1).map_err(DbError::from)?;

        let clients: HashMap<String, ClientRowWithId> = client_rows
            .into_iter()
            .map(|row| (row.record_id.clone(), row))
            .collect();

        let mut items = Vec::with_capacity(report_rows.len());
        for row in report_rows {
            // A client deleted between the two statements takes its
            // reports with it.
            let Some(client) = clients.get(&row.client_id) else {
                debug!(client_id = %row.client_id, "Skipping report of vanished client");
                continue;
            };
            let client_name = client.name.clone();
            let client_logo = client.logo_url.clone();
            let client_brand_color = client.brand_color.clone();
            items.push(ReportWithClient {
                report: row.try_into_report()?,
                client_name,
                client_logo,
                client_brand_color,
            });
        }

        Ok(items)
    }
}
