//! SurrealDB implementation of [`ClientRepository`].

use chrono::{DateTime, Utc};
use clientpulse_core::error::ReportResult;
use clientpulse_core::models::client::{Client, CreateClient};
use clientpulse_core::repository::ClientRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct ClientRow {
    user_id: String,
    name: String,
    logo_url: Option<String>,
    brand_color: Option<String>,
    created_at: DateTime<Utc>,
}

impl ClientRow {
    fn into_client(self, id: Uuid) -> Result<Client, DbError> {
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::Decode(format!("invalid user UUID: {e}")))?;
        Ok(Client {
            id,
            user_id,
            name: self.name,
            logo_url: self.logo_url,
            brand_color: self.brand_color,
            created_at: self.created_at,
        })
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
pub(crate) struct ClientRowWithId {
    pub(crate) record_id: String,
    user_id: String,
    pub(crate) name: String,
    pub(crate) logo_url: Option<String>,
    pub(crate) brand_color: Option<String>,
    created_at: DateTime<Utc>,
}

impl ClientRowWithId {
    fn try_into_client(self) -> Result<Client, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        ClientRow {
            user_id: self.user_id,
            name: self.name,
            logo_url: self.logo_url,
            brand_color: self.brand_color,
            created_at: self.created_at,
        }
        .into_client(id)
    }
}

/// SurrealDB implementation of the Client repository.
#[derive(Clone)]
pub struct SurrealClientRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealClientRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ClientRepository for SurrealClientRepository<C> {
    async fn create(&self, input: CreateClient) -> ReportResult<Client> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('client', $id) SET \
                 user_id = $user_id, name = $name, \
                 logo_url = $logo_url, brand_color = $brand_color",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("name", input.name))
            .bind(("logo_url", input.logo_url))
            .bind(("brand_color", input.brand_color))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<ClientRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "client".into(),
            id: id_str,
        })?;

        row.into_client(id).map_err(Into::into)
    }

    async fn get_by_id(&self, owner_id: Uuid, id: Uuid) -> ReportResult<Client> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('client', $id) \
                 WHERE user_id = $user_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", owner_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ClientRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "client".into(),
            id: id_str,
        })?;

        row.into_client(id).map_err(Into::into)
    }

    async fn list(&self, owner_id: Uuid) -> ReportResult<Vec<Client>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM client \
                 WHERE user_id = $user_id \
                 ORDER BY name ASC",
            )
            .bind(("user_id", owner_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ClientRowWithId> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(|row| row.try_into_client())
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> ReportResult<()> {
        let id_str = id.to_string();

        // The client_cascade_reports event removes the client's reports.
        let result = self
            .db
            .query(
                "DELETE type::record('client', $id) \
                 WHERE user_id = $user_id RETURN BEFORE",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", owner_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<ClientRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "client".into(),
                id: id_str,
            }
            .into());
        }

        Ok(())
    }
}
