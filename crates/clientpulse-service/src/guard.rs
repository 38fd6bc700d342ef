//! Tenant authorization guard.
//!
//! Every write that targets a client and every read that discloses report
//! contents goes through [`TenantGuard`]. The lookup runs per request and
//! is never cached.

use std::time::Duration;

use clientpulse_core::error::{ReportError, ReportResult};
use clientpulse_core::models::client::Client;
use clientpulse_core::models::tenant::TenantIdentity;
use clientpulse_core::repository::ClientRepository;
use tracing::warn;
use uuid::Uuid;

use crate::deadline::with_deadline;

pub struct TenantGuard<C: ClientRepository> {
    clients: C,
    timeout: Duration,
}

impl<C: ClientRepository> TenantGuard<C> {
    pub fn new(clients: C, timeout: Duration) -> Self {
        Self { clients, timeout }
    }

    /// Resolve a caller-supplied client reference to a client owned by
    /// `tenant`.
    ///
    /// Malformed references, unknown clients and clients of other tenants
    /// all fail with [`ReportError::NotFoundOrForbidden`].
    pub async fn authorize(&self, tenant: &TenantIdentity, client_ref: &str) -> ReportResult<Client> {
        let Ok(client_id) = Uuid::parse_str(client_ref.trim()) else {
            warn!(tenant = %tenant.user_id(), client_ref, "Client access denied");
            return Err(ReportError::NotFoundOrForbidden);
        };
        self.authorize_id(tenant, client_id).await
    }

    pub async fn authorize_id(&self, tenant: &TenantIdentity, client_id: Uuid) -> ReportResult<Client> {
        let lookup = self.clients.get_by_id(tenant.user_id(), client_id);
        match with_deadline(self.timeout, "authorize_client", lookup).await {
            Ok(client) => Ok(client),
            Err(ReportError::NotFound { .. }) => {
                warn!(tenant = %tenant.user_id(), client_id = %client_id, "Client access denied");
                Err(ReportError::NotFoundOrForbidden)
            }
            Err(other) => Err(other),
        }
    }

    /// The underlying client repository.
    pub fn clients(&self) -> &C {
        &self.clients
    }
}
