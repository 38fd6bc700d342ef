//! Caller identity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ReportError, ReportResult};

/// Identity of the calling tenant, as resolved by the authentication
/// collaborator.
///
/// Only ever compared against a client's owner; it is never written onto
/// a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantIdentity {
    user_id: Uuid,
}

impl TenantIdentity {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }
}

/// Reject requests that arrived without a resolved identity.
pub fn require_tenant(caller: Option<&TenantIdentity>) -> ReportResult<&TenantIdentity> {
    caller.ok_or(ReportError::Unauthenticated)
}
