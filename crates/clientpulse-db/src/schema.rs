//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode. UUIDs are stored as
//! strings; metrics documents are stored as serialized JSON text so that
//! column order survives the round trip.

use surrealdb::{Connection, Surreal};
use tracing::{debug, info};

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "clients_and_reports",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Clients (owned by exactly one user)
-- =======================================================================
DEFINE TABLE client SCHEMAFULL;
DEFINE FIELD user_id ON TABLE client TYPE string;
DEFINE FIELD name ON TABLE client TYPE string \
    ASSERT string::len(string::trim($value)) > 0;
DEFINE FIELD logo_url ON TABLE client TYPE option<string>;
DEFINE FIELD brand_color ON TABLE client TYPE option<string>;
DEFINE FIELD created_at ON TABLE client TYPE datetime \
    DEFAULT time::now() READONLY;
DEFINE INDEX idx_client_user ON TABLE client COLUMNS user_id;

-- =======================================================================
-- Reports (immutable snapshots, owned by a client)
-- =======================================================================
DEFINE TABLE report SCHEMAFULL;
DEFINE FIELD client_id ON TABLE report TYPE string \
    ASSERT record::exists(type::record('client', $value));
DEFINE FIELD period ON TABLE report TYPE string \
    ASSERT string::len(string::trim($value)) > 0;
DEFINE FIELD metrics_source ON TABLE report TYPE string \
    ASSERT $value IN ['tabular', 'manual'];
DEFINE FIELD metrics_json ON TABLE report TYPE string \
    ASSERT string::len($value) > 2;
DEFINE FIELD ai_summary ON TABLE report TYPE option<string>;
DEFINE FIELD pdf_url ON TABLE report TYPE option<string>;
DEFINE FIELD created_at ON TABLE report TYPE datetime \
    DEFAULT time::now() READONLY;
DEFINE INDEX idx_report_client ON TABLE report COLUMNS client_id;

-- Deleting a client removes its reports.
DEFINE EVENT client_cascade_reports ON TABLE client \
    WHEN $event = 'DELETE' THEN ( \
        DELETE report WHERE client_id = meta::id($before.id) \
    );
";

/// Bring the schema up to date and return the versions applied by this
/// call. An already current database yields an empty list.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<Vec<u32>, DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let applied = applied_versions(db).await?;
    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|m| !applied.contains(&m.version))
        .collect();

    if pending.is_empty() {
        debug!(versions = applied.len(), "Schema is current");
        return Ok(Vec::new());
    }

    let mut done = Vec::with_capacity(pending.len());
    for migration in pending {
        apply(db, migration).await?;
        done.push(migration.version);
    }
    Ok(done)
}

async fn applied_versions<C: Connection>(db: &Surreal<C>) -> Result<Vec<u32>, DbError> {
    let mut result = db.query("SELECT VALUE version FROM _migration").await?;
    let versions: Vec<i64> = result.take(0)?;
    versions
        .into_iter()
        .map(|v| {
            u32::try_from(v).map_err(|_| DbError::Migration(format!("bad recorded version {v}")))
        })
        .collect()
}

async fn apply<C: Connection>(db: &Surreal<C>, migration: &Migration) -> Result<(), DbError> {
    let failed = |stage: &str, e: surrealdb::Error| {
        DbError::Migration(format!(
            "v{} ({}) {stage}: {e}",
            migration.version, migration.name
        ))
    };

    info!(version = migration.version, name = migration.name, "Applying migration");
    db.query(migration.sql)
        .await?
        .check()
        .map_err(|e| failed("schema", e))?;
    db.query("CREATE _migration SET version = $version, name = $name")
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(|e| failed("bookkeeping", e))?;
    info!(version = migration.version, "Migration applied");
    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
