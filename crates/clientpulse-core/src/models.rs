//! Domain models for ClientPulse.
//!
//! These are the core types shared across all crates.

pub mod client;
pub mod metrics;
pub mod report;
pub mod tenant;
