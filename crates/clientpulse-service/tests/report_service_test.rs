//! Integration tests for the report service pipeline.

use std::time::Duration;

use clientpulse_core::error::{ErrorKind, ReportError, ReportResult};
use clientpulse_core::models::client::{Client, CreateClient};
use clientpulse_core::models::metrics::{MetricEntry, MetricsDocument, MetricsSource};
use clientpulse_core::models::report::{CreateReport, CreateReportRequest, Report, ReportWithClient};
use clientpulse_core::models::tenant::TenantIdentity;
use clientpulse_core::repository::{ClientRepository, ReportRepository};
use clientpulse_db::repository::{SurrealClientRepository, SurrealReportRepository};
use clientpulse_service::{IngestRequest, RawMetrics, ReportService, ServiceConfig};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

type Service = ReportService<SurrealClientRepository<Db>, SurrealReportRepository<Db>>;

/// Spin up in-memory DB, run migrations, create two tenants with one
/// client each.
async fn setup() -> (Service, TenantIdentity, Client, TenantIdentity, Client) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    clientpulse_db::run_migrations(&db).await.unwrap();

    let clients = SurrealClientRepository::new(db.clone());
    let alice = TenantIdentity::new(Uuid::new_v4());
    let bob = TenantIdentity::new(Uuid::new_v4());

    let acme = clients
        .create(CreateClient {
            user_id: alice.user_id(),
            name: "Acme".into(),
            logo_url: None,
            brand_color: Some("#FF6600".into()),
        })
        .await
        .unwrap();
    let globex = clients
        .create(CreateClient {
            user_id: bob.user_id(),
            name: "Globex".into(),
            logo_url: None,
            brand_color: None,
        })
        .await
        .unwrap();

    let service = ReportService::new(
        clients,
        SurrealReportRepository::new(db),
        ServiceConfig::default(),
    );
    (service, alice, acme, bob, globex)
}

fn upload(client_id: Uuid, csv: &str) -> IngestRequest {
    IngestRequest {
        client_id: client_id.to_string(),
        period: "Q1 2024".into(),
        metrics: RawMetrics::Upload {
            file_name: "metrics.csv".into(),
            bytes: csv.as_bytes().to_vec(),
        },
        ai_summary: None,
        pdf_url: None,
    }
}

fn manual(client_id: &str, entries: Vec<MetricEntry>) -> IngestRequest {
    IngestRequest {
        client_id: client_id.into(),
        period: "Q1 2024".into(),
        metrics: RawMetrics::Manual(entries),
        ai_summary: Some("".into()),
        pdf_url: None,
    }
}

fn wire_request(client_id: &str) -> CreateReportRequest {
    serde_json::from_value(serde_json::json!({
        "client_id": client_id,
        "period": "Q1",
        "metrics_json": [{"metric": "Visitors", "value": "1200"}],
    }))
    .unwrap()
}

// -----------------------------------------------------------------------
// Ingestion
// -----------------------------------------------------------------------

#[tokio::test]
async fn ingest_csv_surfaces_parse_errors() {
    let (service, alice, acme, _bob, _globex) = setup().await;

    let outcome = service
        .ingest(
            Some(&alice),
            upload(acme.id, "date,visitors\n2024-01,1200\nbad-row\n"),
        )
        .await
        .unwrap();

    assert_eq!(outcome.report.client_id, acme.id);
    assert_eq!(outcome.report.metrics_json.source(), MetricsSource::Tabular);
    assert_eq!(
        outcome.report.metrics_json.to_json().unwrap(),
        r#"[{"date":"2024-01","visitors":"1200"}]"#
    );
    assert_eq!(outcome.parse_errors.len(), 1);
    assert_eq!(outcome.parse_errors[0].row, 2);
}

#[tokio::test]
async fn ingest_manual_drops_incomplete_entries() {
    let (service, alice, acme, _bob, _globex) = setup().await;

    let outcome = service
        .ingest(
            Some(&alice),
            manual(
                &acme.id.to_string(),
                vec![MetricEntry::new("Visitors", "1200"), MetricEntry::new("", "5")],
            ),
        )
        .await
        .unwrap();

    assert_eq!(
        outcome.report.metrics_json,
        MetricsDocument::Manual(vec![MetricEntry::new("Visitors", "1200")])
    );
    assert!(outcome.report.ai_summary.is_none());
    assert!(outcome.parse_errors.is_empty());
}

#[tokio::test]
async fn malformed_csv_never_creates_a_report() {
    let (service, alice, acme, _bob, _globex) = setup().await;

    let result = service
        .ingest(Some(&alice), upload(acme.id, "a,b\nonly-one\n"))
        .await;
    assert!(matches!(result, Err(ReportError::EmptyInput)));
    assert!(service.list(Some(&alice)).await.unwrap().is_empty());
}

#[tokio::test]
async fn manual_without_valid_metrics_is_rejected() {
    let (service, alice, acme, _bob, _globex) = setup().await;

    let result = service
        .ingest(
            Some(&alice),
            manual(&acme.id.to_string(), vec![MetricEntry::new("Visitors", " ")]),
        )
        .await;
    assert!(matches!(result, Err(ReportError::NoValidMetrics)));
}

#[tokio::test]
async fn non_csv_upload_is_a_bad_request() {
    let (service, alice, acme, _bob, _globex) = setup().await;

    let mut request = upload(acme.id, "a\n1\n");
    request.metrics = RawMetrics::Upload {
        file_name: "metrics.xlsx".into(),
        bytes: b"a\n1\n".to_vec(),
    };
    let err = service.ingest(Some(&alice), request).await.unwrap_err();
    assert!(matches!(err, ReportError::Validation { field: "file", .. }));
    assert_eq!(err.kind(), ErrorKind::BadRequest);
}

// -----------------------------------------------------------------------
// Authorization
// -----------------------------------------------------------------------

#[tokio::test]
async fn missing_identity_is_unauthenticated() {
    let (service, _alice, acme, _bob, _globex) = setup().await;

    let result = service.create(None, wire_request(&acme.id.to_string())).await;
    assert!(matches!(result, Err(ReportError::Unauthenticated)));
    assert!(matches!(
        service.list(None).await,
        Err(ReportError::Unauthenticated)
    ));
}

#[tokio::test]
async fn foreign_and_missing_clients_are_indistinguishable() {
    let (service, alice, _acme, _bob, globex) = setup().await;

    let foreign = service
        .create(Some(&alice), wire_request(&globex.id.to_string()))
        .await
        .unwrap_err();
    let missing = service
        .create(Some(&alice), wire_request(&Uuid::new_v4().to_string()))
        .await
        .unwrap_err();
    let malformed = service
        .create(Some(&alice), wire_request("c9"))
        .await
        .unwrap_err();

    for err in [&foreign, &missing, &malformed] {
        assert!(matches!(err, ReportError::NotFoundOrForbidden));
    }
    assert_eq!(foreign.to_string(), missing.to_string());
    assert_eq!(foreign.to_response().error, malformed.to_response().error);
}

#[tokio::test]
async fn reports_are_only_disclosed_to_their_owner() {
    let (service, alice, acme, bob, _globex) = setup().await;

    let report = service
        .create(Some(&alice), wire_request(&acme.id.to_string()))
        .await
        .unwrap();

    let own = service
        .get(Some(&alice), &report.id.to_string())
        .await
        .unwrap();
    assert_eq!(own.id, report.id);

    let foreign = service.get(Some(&bob), &report.id.to_string()).await;
    let missing = service.get(Some(&bob), &Uuid::new_v4().to_string()).await;
    assert!(matches!(foreign, Err(ReportError::NotFoundOrForbidden)));
    assert!(matches!(missing, Err(ReportError::NotFoundOrForbidden)));

    assert!(service.list(Some(&bob)).await.unwrap().is_empty());
}

// -----------------------------------------------------------------------
// Wire create
// -----------------------------------------------------------------------

#[tokio::test]
async fn missing_fields_are_field_specific() {
    let (service, alice, acme, _bob, _globex) = setup().await;
    let client_id = acme.id.to_string();

    let cases = [
        (
            serde_json::json!({"period": "Q1", "metrics_json": [{"metric": "a", "value": "1"}]}),
            "client_id",
        ),
        (
            serde_json::json!({"client_id": client_id, "period": "", "metrics_json": [{"metric": "a", "value": "1"}]}),
            "period",
        ),
        (
            serde_json::json!({"client_id": client_id, "period": "Q1", "metrics_json": []}),
            "metrics_json",
        ),
    ];

    for (body, expected) in cases {
        let request: CreateReportRequest = serde_json::from_value(body).unwrap();
        match service.create(Some(&alice), request).await {
            Err(ReportError::Validation { field, .. }) => assert_eq!(field, expected),
            other => panic!("expected validation error on {expected}, got {other:?}"),
        }
    }
    assert!(service.list(Some(&alice)).await.unwrap().is_empty());
}

#[tokio::test]
async fn tabular_rows_without_columns_are_rejected() {
    let (service, alice, acme, _bob, _globex) = setup().await;

    let request: CreateReportRequest = serde_json::from_value(serde_json::json!({
        "client_id": acme.id.to_string(),
        "period": "Q1",
        "metrics_json": [{"date": "2024-01"}, {}],
    }))
    .unwrap();
    assert_eq!(
        request.metrics_json.as_ref().map(MetricsDocument::source),
        Some(MetricsSource::Tabular)
    );

    match service.create(Some(&alice), request).await {
        Err(ReportError::Validation { field, message }) => {
            assert_eq!(field, "metrics_json");
            assert!(message.contains("row 2"), "{message}");
        }
        other => panic!("expected metrics validation error, got {other:?}"),
    }
    assert!(service.list(Some(&alice)).await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_creates_are_not_deduplicated() {
    let (service, alice, acme, _bob, _globex) = setup().await;
    let client_id = acme.id.to_string();

    let (a, b) = tokio::join!(
        service.create(Some(&alice), wire_request(&client_id)),
        service.create(Some(&alice), wire_request(&client_id)),
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_ne!(a.id, b.id);
    assert_eq!(a.period, b.period);

    let listed = service.list(Some(&alice)).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|r| r.client_name == "Acme"));
}

#[tokio::test]
async fn optional_fields_are_stored() {
    let (service, alice, acme, _bob, _globex) = setup().await;

    let request: CreateReportRequest = serde_json::from_value(serde_json::json!({
        "client_id": acme.id.to_string(),
        "period": "December 2024",
        "metrics_json": [{"date": "2024-12", "visitors": "900"}],
        "ai_summary": "Quiet month.",
        "pdf_url": "",
    }))
    .unwrap();

    let report = service.create(Some(&alice), request).await.unwrap();
    assert_eq!(report.ai_summary.as_deref(), Some("Quiet month."));
    assert!(report.pdf_url.is_none());
    assert_eq!(report.metrics_json.source(), MetricsSource::Tabular);
}

#[tokio::test]
async fn preview_shows_first_rows() {
    let (service, alice, _acme, _bob, _globex) = setup().await;

    let mut csv = String::from("week,visitors\n");
    for week in 1..=7 {
        csv.push_str(&format!("{week},{}\n", week * 100));
    }

    let preview = service
        .preview(Some(&alice), "traffic.csv", csv.as_bytes())
        .unwrap();
    assert_eq!(preview.columns, vec!["week", "visitors"]);
    assert_eq!(preview.rows.len(), 5);
    assert_eq!(preview.total_rows, 7);

    assert!(matches!(
        service.preview(None, "traffic.csv", csv.as_bytes()),
        Err(ReportError::Unauthenticated)
    ));
}

// -----------------------------------------------------------------------
// Timeouts
// -----------------------------------------------------------------------

struct StalledClients;

impl ClientRepository for StalledClients {
    async fn create(&self, _input: CreateClient) -> ReportResult<Client> {
        Err(ReportError::Internal("not used".into()))
    }

    async fn get_by_id(&self, _owner_id: Uuid, _id: Uuid) -> ReportResult<Client> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Err(ReportError::Internal("lookup finished too late".into()))
    }

    async fn list(&self, _owner_id: Uuid) -> ReportResult<Vec<Client>> {
        Ok(Vec::new())
    }

    async fn delete(&self, _owner_id: Uuid, _id: Uuid) -> ReportResult<()> {
        Ok(())
    }
}

struct StalledReports;

impl ReportRepository for StalledReports {
    async fn create(&self, _input: CreateReport) -> ReportResult<Report> {
        Err(ReportError::Internal("not used".into()))
    }

    async fn get_by_id(&self, id: Uuid) -> ReportResult<Report> {
        Err(ReportError::NotFound {
            entity: "report".into(),
            id: id.to_string(),
        })
    }

    async fn list_by_owner(&self, _owner_id: Uuid) -> ReportResult<Vec<ReportWithClient>> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Vec::new())
    }
}

fn stalled_service() -> ReportService<StalledClients, StalledReports> {
    ReportService::new(
        StalledClients,
        StalledReports,
        ServiceConfig {
            store_timeout: Duration::from_millis(50),
            ..Default::default()
        },
    )
}

#[tokio::test]
async fn slow_guard_lookup_is_store_unavailable() {
    let service = stalled_service();
    let tenant = TenantIdentity::new(Uuid::new_v4());

    let err = service
        .create(Some(&tenant), wire_request(&Uuid::new_v4().to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, ReportError::StoreUnavailable));
    assert_eq!(err.kind(), ErrorKind::Unavailable);
}

#[tokio::test]
async fn slow_listing_is_store_unavailable() {
    let service = stalled_service();
    let tenant = TenantIdentity::new(Uuid::new_v4());

    assert!(matches!(
        service.list(Some(&tenant)).await,
        Err(ReportError::StoreUnavailable)
    ));
}

// -----------------------------------------------------------------------
// Client removed between authorization and insert
// -----------------------------------------------------------------------

struct FixedClient(Client);

impl ClientRepository for FixedClient {
    async fn create(&self, _input: CreateClient) -> ReportResult<Client> {
        Err(ReportError::Internal("not used".into()))
    }

    async fn get_by_id(&self, owner_id: Uuid, id: Uuid) -> ReportResult<Client> {
        if owner_id == self.0.user_id && id == self.0.id {
            Ok(self.0.clone())
        } else {
            Err(ReportError::NotFound {
                entity: "client".into(),
                id: id.to_string(),
            })
        }
    }

    async fn list(&self, _owner_id: Uuid) -> ReportResult<Vec<Client>> {
        Ok(vec![self.0.clone()])
    }

    async fn delete(&self, _owner_id: Uuid, _id: Uuid) -> ReportResult<()> {
        Ok(())
    }
}

/// Store that behaves as if the client was deleted right after the guard
/// let the request through.
struct ClientGoneReports;

impl ReportRepository for ClientGoneReports {
    async fn create(&self, input: CreateReport) -> ReportResult<Report> {
        Err(ReportError::NotFound {
            entity: "client".into(),
            id: input.client_id.to_string(),
        })
    }

    async fn get_by_id(&self, id: Uuid) -> ReportResult<Report> {
        Err(ReportError::NotFound {
            entity: "report".into(),
            id: id.to_string(),
        })
    }

    async fn list_by_owner(&self, _owner_id: Uuid) -> ReportResult<Vec<ReportWithClient>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn client_deleted_before_insert_looks_missing() {
    let tenant = TenantIdentity::new(Uuid::new_v4());
    let client = Client {
        id: Uuid::new_v4(),
        user_id: tenant.user_id(),
        name: "Acme".into(),
        logo_url: None,
        brand_color: None,
        created_at: chrono::Utc::now(),
    };
    let service = ReportService::new(
        FixedClient(client.clone()),
        ClientGoneReports,
        ServiceConfig::default(),
    );

    let via_create = service
        .create(Some(&tenant), wire_request(&client.id.to_string()))
        .await
        .unwrap_err();
    let via_ingest = service
        .ingest(
            Some(&tenant),
            manual(
                &client.id.to_string(),
                vec![MetricEntry::new("Visitors", "1200")],
            ),
        )
        .await
        .unwrap_err();

    for err in [via_create, via_ingest] {
        assert!(matches!(err, ReportError::NotFoundOrForbidden), "{err:?}");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
