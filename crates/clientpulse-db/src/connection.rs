//! Opening the report store.

use std::time::Duration;

use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use surrealdb::{Connection, Surreal};
use tracing::{info, warn};

use crate::error::DbError;
use crate::repository::{SurrealClientRepository, SurrealReportRepository};
use crate::schema::run_migrations;

#[derive(Debug, Clone)]
pub struct DbConfig {
    /// WebSocket address, `host:port`.
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: String,
    pub password: String,
    /// Bound on the whole connect, sign-in and namespace selection
    /// sequence (default: 10 seconds).
    pub connect_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "clientpulse".into(),
            database: "reports".into(),
            username: "root".into(),
            password: "root".into(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// A migrated handle to the report store plus factories for the
/// repositories built on it.
pub struct DbManager<C: Connection = Client> {
    db: Surreal<C>,
}

impl<C: Connection> Clone for DbManager<C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

impl DbManager<Client> {
    /// Connect over WebSocket, sign in as root and apply pending
    /// migrations. Fails with [`DbError::Unavailable`] when the server
    /// does not complete the handshake within `connect_timeout`.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to SurrealDB"
        );

        let db = bounded(config, open(config)).await?;
        let manager = Self::from_surreal(db).await?;
        info!(url = %config.url, "Report store ready");
        Ok(manager)
    }
}

impl<C: Connection> DbManager<C> {
    /// Wrap an already selected namespace/database and migrate it.
    pub async fn from_surreal(db: Surreal<C>) -> Result<Self, DbError> {
        let applied = run_migrations(&db).await?;
        if !applied.is_empty() {
            info!(versions = ?applied, "Schema migrated");
        }
        Ok(Self { db })
    }

    pub fn client(&self) -> &Surreal<C> {
        &self.db
    }

    pub fn clients(&self) -> SurrealClientRepository<C> {
        SurrealClientRepository::new(self.db.clone())
    }

    pub fn reports(&self) -> SurrealReportRepository<C> {
        SurrealReportRepository::new(self.db.clone())
    }
}

async fn open(config: &DbConfig) -> Result<Surreal<Client>, DbError> {
    let db = Surreal::new::<Ws>(&config.url).await?;
    db.signin(Root {
        username: config.username.clone(),
        password: config.password.clone(),
    })
    .await?;
    db.use_ns(&config.namespace)
        .use_db(&config.database)
        .await?;
    Ok(db)
}

async fn bounded<T, F>(config: &DbConfig, fut: F) -> Result<T, DbError>
where
    F: Future<Output = Result<T, DbError>>,
{
    match tokio::time::timeout(config.connect_timeout, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                url = %config.url,
                timeout_ms = config.connect_timeout.as_millis() as u64,
                "SurrealDB connect timed out"
            );
            Err(DbError::Unavailable {
                url: config.url.clone(),
                timeout: config.connect_timeout,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(timeout: Duration) -> DbConfig {
        DbConfig {
            url: "db.internal:8000".into(),
            connect_timeout: timeout,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn stalled_handshake_is_unavailable() {
        let config = config(Duration::from_millis(20));
        let result: Result<(), DbError> = bounded(&config, std::future::pending()).await;
        match result {
            Err(DbError::Unavailable { url, timeout }) => {
                assert_eq!(url, "db.internal:8000");
                assert_eq!(timeout, Duration::from_millis(20));
            }
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn handshake_errors_pass_through() {
        let config = config(Duration::from_secs(5));
        let result: Result<(), DbError> =
            bounded(&config, async { Err(DbError::Migration("boom".into())) }).await;
        assert!(matches!(result, Err(DbError::Migration(_))));
    }

    #[test]
    fn default_bounds_the_handshake() {
        let config = DbConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.namespace, "clientpulse");
    }
}
