//! Wiring of the report service onto an open store.

use clientpulse_db::DbManager;
use clientpulse_db::repository::{SurrealClientRepository, SurrealReportRepository};
use clientpulse_service::{ReportService, ServiceConfig};
use surrealdb::Connection;

pub type StoreBackedService<C> =
    ReportService<SurrealClientRepository<C>, SurrealReportRepository<C>>;

pub fn report_service<C: Connection>(
    manager: &DbManager<C>,
    config: ServiceConfig,
) -> StoreBackedService<C> {
    tracing::info!(
        store_timeout_ms = config.store_timeout.as_millis() as u64,
        max_upload_bytes = config.tabular.max_bytes,
        "Report service ready"
    );
    ReportService::new(manager.clients(), manager.reports(), config)
}
