//! SurrealDB repository implementations.

mod client;
mod report;

pub use client::SurrealClientRepository;
pub use report::SurrealReportRepository;
