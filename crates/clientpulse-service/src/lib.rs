//! ClientPulse Service: the report ingestion pipeline.
//!
//! Parser → Normalizer → Tenant Authorization Guard → Report Store, as
//! plain async functions over the `clientpulse-core` repository traits.

pub mod config;
mod deadline;
pub mod guard;
pub mod service;

pub use config::ServiceConfig;
pub use guard::TenantGuard;
pub use service::{IngestOutcome, IngestRequest, RawMetrics, ReportService};
