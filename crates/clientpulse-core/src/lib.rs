//! ClientPulse Core: domain models, error taxonomy, and repository traits
//! shared by every ClientPulse crate.

pub mod error;
pub mod models;
pub mod repository;
