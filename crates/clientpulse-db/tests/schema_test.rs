//! Integration tests for schema initialization using in-memory SurrealDB.

use surrealdb::Surreal;
use clientpulse_core::models::client::CreateClient;
use clientpulse_core::repository::ClientRepository;
use clientpulse_db::DbManager;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

#[tokio::test]
async fn schema_migration_applies_successfully() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    clientpulse_db::run_migrations(&db).await.unwrap();

    let mut result = db.query("INFO FOR DB").await.unwrap();
    let info: Option<surrealdb_types::Value> = result.take(0).unwrap();
    let info = info.expect("INFO FOR DB should return a value");
    let info_str = format!("{:?}", info);

    assert!(info_str.contains("client"), "missing client table");
    assert!(info_str.contains("report"), "missing report table");
    assert!(info_str.contains("_migration"), "missing _migration table");
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    let first = clientpulse_db::run_migrations(&db).await.unwrap();
    let second = clientpulse_db::run_migrations(&db).await.unwrap();
    assert_eq!(first, vec![1]);
    assert!(second.is_empty());

    let mut result = db
        .query("SELECT VALUE version FROM _migration")
        .await
        .unwrap();
    let versions: Vec<i64> = result.take(0).unwrap();
    assert_eq!(versions, vec![1]);
}

#[tokio::test]
async fn manager_migrates_and_hands_out_repositories() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    let manager = DbManager::from_surreal(db).await.unwrap();
    let owner = Uuid::new_v4();
    let client = manager
        .clients()
        .create(CreateClient {
            user_id: owner,
            name: "Acme".into(),
            logo_url: None,
            brand_color: None,
        })
        .await
        .unwrap();

    // A second manager over the same database finds nothing to migrate.
    let again = DbManager::from_surreal(manager.client().clone()).await.unwrap();
    let listed = again.clients().list(owner).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, client.id);
}
