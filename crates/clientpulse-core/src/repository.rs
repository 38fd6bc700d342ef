//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Client lookups take the owning
//! user's id so that tenant isolation is part of every query.

use uuid::Uuid;

use crate::error::ReportResult;
use crate::models::client::{Client, CreateClient};
use crate::models::report::{CreateReport, Report, ReportWithClient};

pub trait ClientRepository: Send + Sync {
    fn create(&self, input: CreateClient) -> impl Future<Output = ReportResult<Client>> + Send;

    /// Fetch a client owned by `owner_id`. A client owned by anyone else
    /// is reported as not found.
    fn get_by_id(
        &self,
        owner_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = ReportResult<Client>> + Send;

    fn list(&self, owner_id: Uuid) -> impl Future<Output = ReportResult<Vec<Client>>> + Send;

    /// Delete a client together with all of its reports.
    fn delete(&self, owner_id: Uuid, id: Uuid) -> impl Future<Output = ReportResult<()>> + Send;
}

/// Report snapshots. Reports are never updated.
pub trait ReportRepository: Send + Sync {
    /// Validate and persist a new report as a single atomic insert.
    ///
    /// Callers must have authorized `input.client_id` for the current
    /// tenant in the same logical operation.
    fn create(&self, input: CreateReport) -> impl Future<Output = ReportResult<Report>> + Send;

    /// Fetch a report without any ownership check. Callers disclosing
    /// the result must authorize its client first.
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ReportResult<Report>> + Send;

    /// All reports whose client is owned by `owner_id`, newest first.
    fn list_by_owner(
        &self,
        owner_id: Uuid,
    ) -> impl Future<Output = ReportResult<Vec<ReportWithClient>>> + Send;
}
