//! Client domain model.
//!
//! Clients are the brands a tenant reports on. Every client has exactly
//! one owning user and is never visible to any other user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    /// The owning user (tenant).
    pub user_id: Uuid,
    /// Display name.
    pub name: String,
    pub logo_url: Option<String>,
    /// Brand color, e.g. `#FF6600`.
    pub brand_color: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a new client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClient {
    pub user_id: Uuid,
    pub name: String,
    pub logo_url: Option<String>,
    pub brand_color: Option<String>,
}
